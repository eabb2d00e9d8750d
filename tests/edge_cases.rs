//! Edge case tests for pooling and flat search.

use ndarray::{array, Array2};
use pool_index::{ann::FlatAnn, Error, Features, Pooling, PoolingMode};

#[test]
fn single_token_every_mode_returns_it() {
    let tokens = array![[0.25, -1.5, 3.0]];
    let pooling = Pooling::new(3, PoolingMode::ALL).unwrap();
    let mut out = Vec::new();
    pooling.apply(&mut out, tokens.view(), &Features::new()).unwrap();

    // sqrt(1) = 1 and weight 1 / 1, so every mode is the identity here.
    for v in &out {
        assert_eq!(v, &tokens.row(0));
    }
}

#[test]
fn numeric_mask_values_other_than_one_count_as_valid() {
    let tokens = array![[2.0], [4.0], [6.0]];
    let f = Features::new().with_attention_mask(array![0.5f32, 0.0, 3.0]);
    let pooling = Pooling::new(1, [PoolingMode::MeanTokens]).unwrap();
    let mut out = Vec::new();
    pooling.apply(&mut out, tokens.view(), &f).unwrap();
    assert!((out[0][0] - 4.0).abs() < 1e-6);
}

#[test]
fn max_handles_negative_only_tokens() {
    let tokens = array![[-5.0, -7.0], [-6.0, -1.0]];
    let pooling = Pooling::new(2, [PoolingMode::MaxTokens]).unwrap();
    let mut out = Vec::new();
    pooling.apply(&mut out, tokens.view(), &Features::new()).unwrap();
    assert_eq!(out[0], array![-5.0, -1.0]);
}

#[test]
fn empty_index_returns_no_neighbors() {
    let mut ann = FlatAnn::new("L2");
    ann.fit(&Array2::<f32>::zeros((0, 4))).unwrap();
    assert!(ann.is_fitted());
    assert!(ann.is_empty());

    let hits = ann.query(&vec![1.0f32, 0.0, 0.0, 0.0], 5).unwrap();
    assert_eq!(hits.indices.dim(), (1, 0));
}

#[test]
fn nan_rows_rank_last_under_l2() {
    let mut ann = FlatAnn::new("L2");
    ann.fit(&array![[f32::NAN, 0.0], [1.0, 1.0], [0.0, 0.0]]).unwrap();
    let hits = ann.query(&vec![0.0f32, 0.0], 3).unwrap();
    assert_eq!(hits.indices.row(0).to_vec(), vec![2, 1, 0]);
    assert!(hits.distances[[0, 2]].is_nan());
}

#[test]
fn nan_rows_rank_last_under_ip() {
    let mut ann = FlatAnn::new("IP");
    ann.fit(&array![[f32::NAN, 0.0], [1.0, 1.0], [0.0, 0.0]]).unwrap();
    let hits = ann.query(&vec![1.0f32, 1.0], 3).unwrap();
    assert_eq!(hits.indices.row(0).to_vec(), vec![1, 2, 0]);
    assert_eq!(hits.distances[[0, 0]], 2.0);
    assert_eq!(hits.distances[[0, 1]], 0.0);
    assert!(hits.distances[[0, 2]].is_nan());
}

#[test]
fn infinite_difference_ranks_last_under_l2() {
    // inf - inf is NaN; the finite rows are infinitely far but still ordered.
    let mut ann = FlatAnn::new("L2");
    ann.fit(&array![[f32::INFINITY, 0.0], [1.0, 1.0], [0.0, 0.0]]).unwrap();
    let hits = ann.query(&vec![f32::INFINITY, 0.0], 3).unwrap();
    assert_eq!(hits.indices.row(0).to_vec(), vec![1, 2, 0]);
    assert_eq!(hits.distances[[0, 0]], f32::INFINITY);
    assert_eq!(hits.distances[[0, 1]], f32::INFINITY);
    assert!(hits.distances[[0, 2]].is_nan());
}

#[test]
fn empty_row_list_fits_zero_by_zero() {
    let mut ann = FlatAnn::new("IP");
    let rows: Vec<Vec<f32>> = Vec::new();
    ann.fit(&rows).unwrap();
    assert_eq!(ann.dimension(), Some(0));
    assert_eq!(
        ann.query(&vec![1.0f32], 1),
        Err(Error::DimensionMismatch { expected: 0, found: 1 })
    );
}

#[test]
fn large_k_is_clamped() {
    let mut ann = FlatAnn::new("IP");
    ann.fit(&array![[1.0f32, 0.0], [0.0, 1.0]]).unwrap();
    let hits = ann.query(&vec![1.0f32, 1.0], usize::MAX).unwrap();
    assert_eq!(hits.k(), 2);
}
