#![no_main]
use libfuzzer_sys::fuzz_target;
use revdelta::diff::{apply_delta, compute_delta};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let split = text
        .char_indices()
        .nth(text.chars().count() / 2)
        .map_or(text.len(), |(i, _)| i);
    let (old, new) = text.split_at(split);

    let delta = compute_delta(old, new);
    assert_eq!(apply_delta(old, &delta).unwrap(), new);
});
