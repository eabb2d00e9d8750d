use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use pool_index::{ann::FlatAnn, simd, Features, Pooling, PoolingMode};

fn random_vec(dim: usize, seed: u64) -> Vec<f32> {
    // Simple LCG for reproducible "random" vectors
    let mut x = seed;
    (0..dim)
        .map(|_| {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            (x as f32 / u64::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

fn random_matrix(rows: usize, dim: usize, seed: u64) -> Array2<f32> {
    let data: Vec<f32> = (0..rows)
        .flat_map(|i| random_vec(dim, seed + i as u64))
        .collect();
    Array2::from_shape_vec((rows, dim), data).expect("rows * dim elements")
}

fn bench_simd(c: &mut Criterion) {
    let mut g = c.benchmark_group("simd");

    for &dim in &[128, 384, 768, 1536] {
        let a = random_vec(dim, 1);
        let b = random_vec(dim, 2);

        g.bench_with_input(BenchmarkId::new("dot", dim), &dim, |bench, _| {
            bench.iter(|| black_box(simd::dot(&a, &b)));
        });

        g.bench_with_input(BenchmarkId::new("squared_l2", dim), &dim, |bench, _| {
            bench.iter(|| black_box(simd::squared_l2(&a, &b)));
        });
    }

    g.finish();
}

fn bench_pooling(c: &mut Criterion) {
    let mut g = c.benchmark_group("pooling");

    // Typical sentence encoder: 128 tokens, 384 dims, ~60% real tokens
    let tokens = random_matrix(128, 384, 7);
    let mask: Vec<bool> = (0..128).map(|i| i < 77).collect();
    let features = Features::new().with_attention_mask_bools(&mask);

    for mode in PoolingMode::ALL {
        let pooling = Pooling::new(384, [mode]).expect("non-zero dimension");
        g.bench_function(mode.name(), |bench| {
            bench.iter(|| black_box(pooling.pool(tokens.view(), &features)));
        });
    }

    g.finish();
}

fn bench_flat_search(c: &mut Criterion) {
    let mut g = c.benchmark_group("flat_search");

    let dim = 384;
    let query = random_vec(dim, 0);

    for &n in &[1_000, 10_000] {
        let data = random_matrix(n, dim, 100);
        for metric in ["L2", "IP"] {
            let mut ann = FlatAnn::new(metric);
            ann.fit(&data).expect("valid matrix");
            g.bench_with_input(BenchmarkId::new(metric, n), &n, |bench, _| {
                bench.iter(|| black_box(ann.query(&query, 10)));
            });
        }
    }

    g.finish();
}

criterion_group!(benches, bench_simd, bench_pooling, bench_flat_search);
criterion_main!(benches);
