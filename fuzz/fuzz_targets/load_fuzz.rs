#![no_main]
use libfuzzer_sys::fuzz_target;
use revdelta::store::{StoreOptions, VersionStore};

fuzz_target!(|data: &[u8]| {
    // Loading arbitrary bytes must never panic, only return errors.
    // Anything that loads must reconstruct every version it claims to hold.
    if let Ok(store) = VersionStore::from_reader(data, StoreOptions::default()) {
        for n in 1..=store.len() {
            store.get_version(n).expect("loaded store failed to replay");
        }
    }
});
