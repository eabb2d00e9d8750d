#![no_main]

use libfuzzer_sys::fuzz_target;
use ndarray::Array2;
use pool_index::{Features, Pooling, PoolingMode};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let mut offset = 0;
    let n_tokens = (data[offset] as usize % 32) + 1; // 1-32 tokens
    offset += 1;
    let dim = (data[offset] as usize % 64) + 1; // 1-64 dimensions
    offset += 1;
    let mask_bits = data[offset];
    offset += 1;

    let required_bytes = n_tokens * dim * 4;
    if data.len() < offset + required_bytes {
        return;
    }

    let mut values = Vec::with_capacity(n_tokens * dim);
    for _ in 0..n_tokens * dim {
        let val = f32::from_le_bytes(data[offset..offset + 4].try_into().unwrap());
        // Skip if NaN or infinite (these are handled but slow down fuzzing)
        if !val.is_finite() {
            return;
        }
        values.push(val);
        offset += 4;
    }
    let tokens = Array2::from_shape_vec((n_tokens, dim), values).unwrap();
    let mask: Vec<bool> = (0..n_tokens).map(|i| mask_bits >> (i % 8) & 1 == 1).collect();
    let features = Features::new().with_attention_mask_bools(&mask);

    // Every mode over any well-shaped input must succeed
    let pooling = Pooling::new(dim, PoolingMode::ALL).unwrap();
    let pooled = pooling.pool(tokens.view(), &features).unwrap();
    assert_eq!(pooled.len(), pooling.output_dimension());
});
