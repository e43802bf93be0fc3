// Integration tests for the version store.
//
// Exercises the public API end to end: add/get, boundary errors, identity
// deltas, checkpoint settings, save/load through memory and through files,
// and rejection of damaged history documents.

use revdelta::diff::{self, EditOp};
use revdelta::io::{load_file, save_file};
use revdelta::store::{StoreOptions, VersionStore};
use revdelta::StoreError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SCENARIO: [&str; 4] = [
    "Hello World",
    "Hello World!",
    "Hello, World!",
    "Hello, World!!!",
];

fn store_from(texts: &[&str], opts: StoreOptions) -> VersionStore {
    let mut store = VersionStore::with_options(opts);
    for t in texts {
        store.add_version(*t);
    }
    store
}

fn saved(store: &VersionStore) -> Vec<u8> {
    let mut buf = Vec::new();
    store.save(&mut buf).unwrap();
    buf
}

fn assert_corrupt(doc: &str) {
    let mut store = store_from(&SCENARIO, StoreOptions::default());
    match store.load(doc.as_bytes()) {
        Err(StoreError::CorruptStore(_)) => {}
        other => panic!("expected CorruptStore for {doc}, got {other:?}"),
    }
    assert_eq!(store.len(), 4, "store changed after failed load of {doc}");
    assert_eq!(store.get_version(4).unwrap(), "Hello, World!!!");
}

// ---------------------------------------------------------------------------
// Reconstruction
// ---------------------------------------------------------------------------

#[test]
fn hello_world_scenario() {
    let store = store_from(&SCENARIO, StoreOptions::default());
    for (i, text) in SCENARIO.iter().enumerate() {
        assert_eq!(store.get_version(i + 1).unwrap(), *text);
    }

    let mut restored = VersionStore::new();
    restored.load(saved(&store).as_slice()).unwrap();
    assert_eq!(restored.get_version(4).unwrap(), "Hello, World!!!");
}

#[test]
fn scenario_deltas_are_small() {
    let store = store_from(&SCENARIO, StoreOptions::default());
    let edits: Vec<usize> = store.deltas().iter().map(|d| d.stats().edits()).collect();
    assert_eq!(edits, vec![1, 1, 2]);
}

#[test]
fn boundary_versions_are_not_found() {
    let store = store_from(&SCENARIO, StoreOptions::default());
    assert!(matches!(
        store.get_version(0),
        Err(StoreError::VersionNotFound { requested: 0, .. })
    ));
    assert!(matches!(
        store.get_version(5),
        Err(StoreError::VersionNotFound {
            requested: 5,
            available: 4
        })
    ));
}

#[test]
fn first_add_produces_no_deltas() {
    let store = store_from(&["only"], StoreOptions::default());
    assert!(store.deltas().is_empty());
    assert_eq!(saved(&store), br#"{"base":"only","deltas":[]}"#);
}

#[test]
fn identical_versions_use_keep_only_delta() {
    let store = store_from(&["x y z", "x y z"], StoreOptions::default());
    let delta = &store.deltas()[0];
    assert!(delta.iter().all(|op| matches!(op, EditOp::Keep(_))));
    assert_eq!(store.get_version(1).unwrap(), "x y z");
    assert_eq!(store.get_version(2).unwrap(), "x y z");
}

#[test]
fn long_history_with_every_checkpoint_setting() {
    let mut texts = Vec::new();
    let mut doc = String::from("fn main() {}\n");
    for i in 0..60 {
        match i % 4 {
            0 => doc.push_str(&format!("// note {i}\n")),
            1 => doc = doc.replacen("note", "NOTE", 1),
            2 => doc.insert_str(0, "use std::io;\n"),
            _ => {
                let cut = doc.len() / 3;
                doc.remove(cut);
            }
        }
        texts.push(doc.clone());
    }

    for interval in [0, 1, 2, 7, 16, 100] {
        let mut store = VersionStore::with_options(StoreOptions {
            checkpoint_interval: interval,
            ..Default::default()
        });
        for t in &texts {
            store.add_version(t.as_str());
        }
        for (i, t) in texts.iter().enumerate() {
            assert_eq!(
                &store.get_version(i + 1).unwrap(),
                t,
                "interval {interval}, version {}",
                i + 1
            );
        }
    }
}

#[test]
fn unicode_history() {
    let texts = ["héllo", "héllo wörld", "こんにちは wörld", "", "🦀 crab"];
    let store = store_from(&texts, StoreOptions::default());
    let mut restored = VersionStore::new();
    restored.load(saved(&store).as_slice()).unwrap();
    for (i, t) in texts.iter().enumerate() {
        assert_eq!(restored.get_version(i + 1).unwrap(), *t);
    }
}

#[test]
fn store_is_readable_from_many_threads() {
    let store = store_from(&SCENARIO, StoreOptions::default());
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for (i, t) in SCENARIO.iter().enumerate() {
                    assert_eq!(store.get_version(i + 1).unwrap(), *t);
                }
            });
        }
    });
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn persisted_layout_matches_contract() {
    let store = store_from(&["ab", "b"], StoreOptions::default());
    let json: serde_json::Value = serde_json::from_slice(&saved(&store)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "base": "ab",
            "deltas": [[{"op": "delete"}, {"op": "keep", "char": "b"}]]
        })
    );
}

#[test]
fn load_recomputes_identical_deltas() {
    let store = store_from(&SCENARIO, StoreOptions::default());
    let restored =
        VersionStore::from_reader(saved(&store).as_slice(), StoreOptions::default()).unwrap();
    assert_eq!(restored.deltas(), store.deltas());
    assert_eq!(saved(&restored), saved(&store));
}

#[test]
fn restored_store_keeps_growing() {
    let store = store_from(&SCENARIO, StoreOptions::default());
    let mut restored = VersionStore::new();
    restored.load(saved(&store).as_slice()).unwrap();
    assert_eq!(restored.add_version("Goodbye, World!!!"), 5);
    assert_eq!(restored.get_version(5).unwrap(), "Goodbye, World!!!");
    assert_eq!(restored.get_version(3).unwrap(), "Hello, World!");
    assert_eq!(restored.find_version("Hello World!").unwrap(), Some(2));
}

#[test]
fn legacy_base_version_key_loads() {
    let doc = r#"{"base_version":"abc","deltas":[[{"op":"keep","char":"a"},{"op":"keep","char":"b"},{"op":"keep","char":"c"},{"op":"insert","char":"d"}]]}"#;
    let store = VersionStore::from_reader(doc.as_bytes(), StoreOptions::default()).unwrap();
    assert_eq!(store.get_version(2).unwrap(), "abcd");
}

#[test]
fn damaged_documents_are_rejected() {
    assert_corrupt("");
    assert_corrupt("not json");
    assert_corrupt(r#"{"deltas":[]}"#);
    assert_corrupt(r#"{"base":"a"}"#);
    assert_corrupt(r#"{"base":"a","deltas":"[]"}"#);
    assert_corrupt(r#"{"base":"a","deltas":[{"op":"keep","char":"a"}]}"#);
    assert_corrupt(r#"{"base":"a","deltas":[[{"op":"copy","char":"a"}]]}"#);
    assert_corrupt(r#"{"base":"a","deltas":[[{"op":"keep","char":"ab"}]]}"#);
    assert_corrupt(r#"{"base":"a","deltas":[[{"op":"delete","char":"a"}]]}"#);
    assert_corrupt(r#"{"base":"a","deltas":[[{"op":"keep","char":"z"}]]}"#);
    assert_corrupt(r#"{"base":"a","deltas":[[{"op":"keep","char":"a"},{"op":"delete"}]]}"#);
    assert_corrupt(r#"{"base":"ab","deltas":[[{"op":"keep","char":"a"}]]}"#);
    assert_corrupt(r#"{"base":null,"deltas":[[]]}"#);
}

#[test]
fn file_roundtrip_and_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");

    let first = store_from(&SCENARIO[..2], StoreOptions::default());
    save_file(&first, &path).unwrap();
    let second = store_from(&SCENARIO, StoreOptions::default());
    let stats = save_file(&second, &path).unwrap();
    assert_eq!(stats.versions, 4);

    let (restored, loaded) = load_file(&path, StoreOptions::default()).unwrap();
    assert_eq!(loaded.versions, 4);
    assert_eq!(restored.get_version(4).unwrap(), "Hello, World!!!");
}

#[test]
fn diff_engine_is_reachable_from_the_crate_root() {
    let delta = diff::compute_delta("Hello World", "Hello, World!!!");
    assert_eq!(diff::apply_delta("Hello World", &delta).unwrap(), "Hello, World!!!");
    assert!(matches!(
        diff::apply_delta("Hello", &delta),
        Err(diff::PatchError::InputExhausted { .. } | diff::PatchError::KeepMismatch { .. })
    ));
}
