#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pool_index::ann::FlatAnn;

#[derive(Arbitrary, Debug)]
struct Input {
    ip: bool,
    rows: Vec<Vec<f32>>,
    query: Vec<f32>,
    k: u8,
}

fuzz_target!(|input: Input| {
    let mut ann = FlatAnn::new(if input.ip { "IP" } else { "L2" });
    // Ragged rows are rejected, never a panic
    if ann.fit(&input.rows).is_err() {
        return;
    }
    if let Ok(hits) = ann.query(&input.query, input.k as usize) {
        assert_eq!(hits.k(), (input.k as usize).min(input.rows.len()));
        assert!(hits.indices.iter().all(|&i| i < input.rows.len()));
    }
});
