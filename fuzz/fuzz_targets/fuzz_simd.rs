#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pool_index::simd;

#[derive(Arbitrary, Debug)]
struct VecPair {
    a: Vec<f32>,
    b: Vec<f32>,
}

fuzz_target!(|input: VecPair| {
    // Should not panic on any input, including mismatched lengths
    let _ = simd::dot(&input.a, &input.b);
    let _ = simd::squared_l2(&input.a, &input.b);
});
