// Version store: base snapshot plus one delta per transition.
//
// The authoritative state is `(base, deltas)`. Everything else held here is
// derived from it and rebuilt on load:
//   - `latest`      — text of the newest version, the diff source for adds
//   - `checkpoints` — full text of every Nth version, replay start points
//   - `index`       — prefix index for content lookup and space accounting
//
// - `config` — StoreOptions
// - `prefix` — PrefixIndex (arena trie)
// - `record` — persisted JSON layout

pub mod config;
pub mod prefix;
mod record;

pub use config::StoreOptions;
pub use prefix::{PrefixIndex, PrefixStats};

use std::collections::BTreeMap;
use std::io::{BufReader, Read, Write};

use crate::diff::{self, Delta};
use crate::error::{Result, StoreError};

use record::{HistoryRecord, HistoryRef};

// ---------------------------------------------------------------------------
// VersionStore
// ---------------------------------------------------------------------------

/// Ordered history of text versions, addressed by 1-based number.
///
/// Mutations take `&mut self` and reads take `&self`, so concurrent readers
/// are allowed only while nothing is writing. Wrap in a `RwLock` to share.
///
/// # Example
/// ```
/// use revdelta::store::VersionStore;
///
/// let mut store = VersionStore::new();
/// store.add_version("Hello World");
/// store.add_version("Hello, World!");
/// assert_eq!(store.get_version(1).unwrap(), "Hello World");
/// assert_eq!(store.get_version(2).unwrap(), "Hello, World!");
/// ```
#[derive(Debug, Clone)]
pub struct VersionStore {
    opts: StoreOptions,
    base: Option<String>,
    deltas: Vec<Delta>,
    latest: String,
    checkpoints: BTreeMap<usize, String>,
    index: Option<PrefixIndex>,
}

impl Default for VersionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionStore {
    /// Create an empty store with default options.
    pub fn new() -> Self {
        Self::with_options(StoreOptions::default())
    }

    pub fn with_options(opts: StoreOptions) -> Self {
        let index = opts.prefix_index.then(PrefixIndex::new);
        Self {
            opts,
            base: None,
            deltas: Vec::new(),
            latest: String::new(),
            checkpoints: BTreeMap::new(),
            index,
        }
    }

    /// Read a persisted history into a new store.
    ///
    /// `reader` is wrapped in a `BufReader`, so an unbuffered `File` is fine.
    pub fn from_reader<R: Read>(reader: R, opts: StoreOptions) -> Result<Self> {
        let reader = BufReader::new(reader);
        let record: HistoryRecord = serde_json::from_reader(reader).map_err(|e| {
            if e.is_io() {
                StoreError::IoFailure(e.into())
            } else {
                log::warn!("rejecting history record: {e}");
                StoreError::CorruptStore(e.to_string())
            }
        })?;
        Self::from_record(record, opts)
    }

    fn from_record(record: HistoryRecord, opts: StoreOptions) -> Result<Self> {
        let mut store = Self::with_options(opts);

        let Some(base) = record.base else {
            if !record.deltas.is_empty() {
                return Err(StoreError::CorruptStore(format!(
                    "null base with {} deltas",
                    record.deltas.len()
                )));
            }
            return Ok(store);
        };

        store.commit(None, base);
        for delta in record.deltas {
            let version = store.len() + 1;
            let text = diff::apply_delta(&store.latest, &delta).map_err(|e| {
                log::warn!("rejecting history record: delta for version {version}: {e}");
                StoreError::CorruptStore(format!("delta for version {version} does not replay: {e}"))
            })?;
            store.commit(Some(delta), text);
        }

        log::debug!("loaded {} versions", store.len());
        Ok(store)
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Append a new version, returning its number.
    ///
    /// The first version becomes the base; later ones are stored as the delta
    /// from the previous version.
    pub fn add_version(&mut self, text: impl Into<String>) -> usize {
        let text = text.into();
        let delta = self.base.is_some().then(|| {
            let delta = diff::compute_delta(&self.latest, &text);
            let stats = delta.stats();
            log::debug!(
                "version {}: {} keep, {} insert, {} delete",
                self.len() + 1,
                stats.keeps,
                stats.inserts,
                stats.deletes
            );
            delta
        });
        self.commit(delta, text)
    }

    /// Replace this store's history with the one read from `reader`.
    ///
    /// All-or-nothing: on error the store is left as it was.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<()> {
        *self = Self::from_reader(reader, self.opts.clone())?;
        Ok(())
    }

    fn commit(&mut self, delta: Option<Delta>, text: String) -> usize {
        match delta {
            Some(delta) => self.deltas.push(delta),
            None => self.base = Some(text.clone()),
        }
        let version = self.len();
        if self.opts.is_checkpoint(version) {
            self.checkpoints.insert(version, text.clone());
        }
        if let Some(index) = self.index.as_mut() {
            index.insert(&text, version);
        }
        self.latest = text;
        version
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Reconstruct version `n` (1-based).
    pub fn get_version(&self, n: usize) -> Result<String> {
        let available = self.len();
        if n == 0 || n > available {
            return Err(StoreError::VersionNotFound {
                requested: n,
                available,
            });
        }
        if n == available {
            return Ok(self.latest.clone());
        }

        let (start, mut text) = match self.checkpoints.range(..=n).next_back() {
            Some((&v, text)) => (v, text.clone()),
            None => (1, self.base.clone().unwrap_or_default()),
        };
        log::trace!("version {n}: replaying {} deltas from {start}", n - start);

        for version in start + 1..=n {
            text = self.replay(version, &text)?;
        }
        Ok(text)
    }

    fn replay(&self, version: usize, prev: &str) -> Result<String> {
        diff::apply_delta(prev, &self.deltas[version - 2])
            .map_err(|source| StoreError::CorruptDelta { version, source })
    }

    /// Write `{base, deltas}` as JSON.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let record = HistoryRef {
            base: self.base.as_deref(),
            deltas: &self.deltas,
        };
        serde_json::to_writer(writer, &record).map_err(|e| {
            if e.is_io() {
                StoreError::IoFailure(e.into())
            } else {
                StoreError::CorruptStore(e.to_string())
            }
        })?;
        log::debug!("saved {} versions", self.len());
        Ok(())
    }

    /// Number of committed versions.
    pub fn len(&self) -> usize {
        match self.base {
            Some(_) => self.deltas.len() + 1,
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_none()
    }

    /// Text of version 1.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Text of the newest version.
    pub fn latest(&self) -> Option<&str> {
        self.base.as_ref().map(|_| self.latest.as_str())
    }

    pub fn deltas(&self) -> &[Delta] {
        &self.deltas
    }

    /// The delta that produces version `n` from version `n - 1`.
    pub fn delta(&self, n: usize) -> Option<&Delta> {
        n.checked_sub(2).and_then(|i| self.deltas.get(i))
    }

    /// Every version in order, replaying each delta once.
    pub fn versions(&self) -> Versions<'_> {
        Versions {
            store: self,
            next: 1,
            current: String::new(),
        }
    }

    /// Lowest version whose text equals `text`.
    pub fn find_version(&self, text: &str) -> Result<Option<usize>> {
        if let Some(index) = &self.index {
            return Ok(index.first_version(text));
        }
        for (i, version) in self.versions().enumerate() {
            if version? == text {
                return Ok(Some(i + 1));
            }
        }
        Ok(None)
    }

    /// Prefix sharing figures, if the index is enabled.
    pub fn prefix_stats(&self) -> Option<PrefixStats> {
        self.index.as_ref().map(PrefixIndex::stats)
    }
}

// ---------------------------------------------------------------------------
// Versions iterator
// ---------------------------------------------------------------------------

/// Sequential reconstruction of every version; see [`VersionStore::versions`].
pub struct Versions<'a> {
    store: &'a VersionStore,
    next: usize,
    current: String,
}

impl Iterator for Versions<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let version = self.next;
        let base = self.store.base.as_deref()?;
        if version > self.store.len() {
            return None;
        }
        self.next += 1;

        let text = if version == 1 {
            Ok(base.to_owned())
        } else {
            self.store.replay(version, &self.current)
        };
        match text {
            Ok(text) => {
                self.current.clone_from(&text);
                Some(Ok(text))
            }
            Err(e) => {
                // Later versions depend on this one.
                self.next = usize::MAX;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.store.len() + 1).saturating_sub(self.next);
        (left, Some(left))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::EditOp;

    const SCENARIO: [&str; 4] = [
        "Hello World",
        "Hello World!",
        "Hello, World!",
        "Hello, World!!!",
    ];

    fn scenario_store(opts: StoreOptions) -> VersionStore {
        let mut store = VersionStore::with_options(opts);
        for text in SCENARIO {
            store.add_version(text);
        }
        store
    }

    #[test]
    fn first_version_has_no_delta() {
        let mut store = VersionStore::new();
        assert_eq!(store.add_version("base"), 1);
        assert!(store.deltas().is_empty());
        assert_eq!(store.len(), 1);
        assert_eq!(store.base(), Some("base"));
    }

    #[test]
    fn scenario_roundtrip() {
        let store = scenario_store(StoreOptions::default());
        assert_eq!(store.len(), 4);
        assert_eq!(store.deltas().len(), 3);
        for (i, text) in SCENARIO.iter().enumerate() {
            assert_eq!(store.get_version(i + 1).unwrap(), *text);
        }
    }

    #[test]
    fn out_of_range_versions() {
        let store = scenario_store(StoreOptions::default());
        for n in [0, 5, usize::MAX] {
            match store.get_version(n) {
                Err(StoreError::VersionNotFound {
                    requested,
                    available,
                }) => {
                    assert_eq!(requested, n);
                    assert_eq!(available, 4);
                }
                other => panic!("expected VersionNotFound for {n}, got {other:?}"),
            }
        }
        assert!(matches!(
            VersionStore::new().get_version(1),
            Err(StoreError::VersionNotFound { available: 0, .. })
        ));
    }

    #[test]
    fn repeated_text_gives_keep_only_delta() {
        let mut store = VersionStore::new();
        store.add_version("same text");
        store.add_version("same text");
        let delta = store.delta(2).unwrap();
        assert!(delta.is_identity());
        assert_eq!(delta.len(), 9);
        assert_eq!(store.get_version(1).unwrap(), "same text");
        assert_eq!(store.get_version(2).unwrap(), "same text");
    }

    #[test]
    fn empty_first_version_is_still_a_version() {
        let mut store = VersionStore::new();
        store.add_version("");
        store.add_version("now with text");
        assert_eq!(store.len(), 2);
        assert_eq!(store.get_version(1).unwrap(), "");
        assert_eq!(store.get_version(2).unwrap(), "now with text");
    }

    #[test]
    fn checkpoints_do_not_change_results() {
        let texts: Vec<String> = (0..40)
            .map(|i| format!("revision {i}: {}", "ab".repeat(i % 7)))
            .collect();
        let mut expected = None;
        for interval in [0, 1, 3, 16] {
            let mut store = VersionStore::with_options(StoreOptions {
                checkpoint_interval: interval,
                ..Default::default()
            });
            for t in &texts {
                store.add_version(t.as_str());
            }
            let got: Vec<String> = (1..=texts.len())
                .map(|n| store.get_version(n).unwrap())
                .collect();
            assert_eq!(got, texts, "interval {interval}");
            if let Some(prev) = &expected {
                assert_eq!(&got, prev);
            }
            expected = Some(got);
        }
    }

    #[test]
    fn save_load_roundtrip() {
        let store = scenario_store(StoreOptions::default());
        let mut buf = Vec::new();
        store.save(&mut buf).unwrap();

        let mut restored = VersionStore::new();
        restored.load(buf.as_slice()).unwrap();
        assert_eq!(restored.len(), 4);
        assert_eq!(restored.get_version(4).unwrap(), "Hello, World!!!");
        for n in 1..=4 {
            assert_eq!(restored.get_version(n).unwrap(), store.get_version(n).unwrap());
        }
        assert_eq!(restored.deltas(), store.deltas());
    }

    #[test]
    fn empty_store_roundtrip() {
        let mut buf = Vec::new();
        VersionStore::new().save(&mut buf).unwrap();
        assert_eq!(buf, br#"{"base":null,"deltas":[]}"#);

        let restored = VersionStore::from_reader(buf.as_slice(), StoreOptions::default()).unwrap();
        assert!(restored.is_empty());
        assert_eq!(restored.latest(), None);
    }

    /// Reader that counts how many times it is asked for bytes.
    struct CallCounter<'a> {
        inner: &'a [u8],
        calls: usize,
    }

    impl std::io::Read for CallCounter<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.calls += 1;
            std::io::Read::read(&mut self.inner, buf)
        }
    }

    #[test]
    fn load_buffers_the_reader() {
        let mut buf = Vec::new();
        scenario_store(StoreOptions::default()).save(&mut buf).unwrap();
        assert!(buf.len() > 100);

        let mut reader = CallCounter {
            inner: buf.as_slice(),
            calls: 0,
        };
        let restored = VersionStore::from_reader(&mut reader, StoreOptions::default()).unwrap();
        assert_eq!(restored.get_version(4).unwrap(), "Hello, World!!!");
        assert!(reader.calls < 8, "{} reads for {} bytes", reader.calls, buf.len());
    }

    #[test]
    fn failed_load_leaves_store_unchanged() {
        let mut store = scenario_store(StoreOptions::default());
        let bad = br#"{"base":"abc","deltas":[[{"op":"keep","char":"a"},{"op":"delete"},{"op":"delete"},{"op":"delete"}]]}"#;
        let err = store.load(bad.as_slice()).unwrap_err();
        assert!(matches!(err, StoreError::CorruptStore(_)), "{err:?}");
        assert_eq!(store.len(), 4);
        assert_eq!(store.get_version(4).unwrap(), "Hello, World!!!");
    }

    #[test]
    fn null_base_with_deltas_is_corrupt() {
        let bad = br#"{"base":null,"deltas":[[]]}"#;
        let err = VersionStore::from_reader(bad.as_slice(), StoreOptions::default()).unwrap_err();
        assert!(matches!(err, StoreError::CorruptStore(_)));
    }

    #[test]
    fn corrupt_delta_surfaces_on_replay() {
        let mut store = VersionStore::with_options(StoreOptions {
            checkpoint_interval: 0,
            prefix_index: false,
        });
        store.add_version("ab");
        store.add_version("abc");
        store.add_version("abcd");
        // Tamper with the middle delta so it no longer matches version 1.
        store.deltas[0] = Delta::new(vec![EditOp::Keep('a'), EditOp::Delete, EditOp::Delete]);

        match store.get_version(2) {
            Err(StoreError::CorruptDelta { version, .. }) => assert_eq!(version, 2),
            other => panic!("expected CorruptDelta, got {other:?}"),
        }
        let collected: Vec<_> = store.versions().collect();
        assert_eq!(collected.len(), 2);
        assert!(collected[1].is_err());
    }

    #[test]
    fn versions_iterates_in_order() {
        let store = scenario_store(StoreOptions::default());
        let all: Vec<String> = store.versions().collect::<Result<_>>().unwrap();
        assert_eq!(all, SCENARIO);
        assert_eq!(store.versions().size_hint(), (4, Some(4)));
        assert_eq!(VersionStore::new().versions().count(), 0);
    }

    #[test]
    fn find_version_with_and_without_index() {
        for prefix_index in [true, false] {
            let mut store = VersionStore::with_options(StoreOptions {
                prefix_index,
                ..Default::default()
            });
            store.add_version("one");
            store.add_version("two");
            store.add_version("one");
            assert_eq!(store.find_version("one").unwrap(), Some(1));
            assert_eq!(store.find_version("two").unwrap(), Some(2));
            assert_eq!(store.find_version("three").unwrap(), None);
            assert_eq!(store.prefix_stats().is_some(), prefix_index);
        }
    }

    #[test]
    fn delta_accessor_bounds() {
        let store = scenario_store(StoreOptions::default());
        assert!(store.delta(0).is_none());
        assert!(store.delta(1).is_none());
        assert!(store.delta(2).is_some());
        assert!(store.delta(4).is_some());
        assert!(store.delta(5).is_none());
    }

    #[test]
    fn store_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VersionStore>();
    }
}
