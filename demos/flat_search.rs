//! Example: exact nearest-neighbor search with L2 and IP
//!
//! Fits the same small corpus under both metrics and prints the top hits for
//! a query, then shows the three error families (state, type, configuration).
//!
//! Run with `RUST_LOG=info` to see the fit/query log lines.

use ndarray::array;
use pool_index::{ann::FlatAnn, Error};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Flat Search Example\n");

    let names = ["rust", "c++", "python", "javascript"];
    // Toy 3-d embeddings: (systems, scripting, web)
    let corpus = array![
        [0.9f32, 0.1, 0.2],
        [0.8, 0.0, 0.1],
        [0.1, 0.9, 0.3],
        [0.1, 0.6, 0.9],
    ];
    let query = vec![0.7f32, 0.2, 0.1];

    for metric in ["L2", "IP"] {
        let mut ann = FlatAnn::new(metric);
        ann.fit(&corpus)?;
        let hits = ann.query(&query, 3)?;

        println!("{metric}:");
        for (rank, (idx, value)) in hits.row(0).enumerate() {
            println!("  {}. {:<12} {:.4}", rank + 1, names[idx], value);
        }
        println!();
    }

    println!("Errors:");
    let unfit = FlatAnn::new("L2");
    println!("  query before fit: {}", unfit.query(&query, 1).unwrap_err());

    let mut ann = FlatAnn::new("L2");
    println!("  fit with a vector: {}", ann.fit(&query).unwrap_err());

    let mut cosine = FlatAnn::new("COSINE");
    println!("  unknown metric: {}", cosine.fit(&corpus).unwrap_err());

    Ok(())
}
