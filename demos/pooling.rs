//! Example: pooling padded encoder output into sentence vectors
//!
//! Encoders emit one vector per token, padded to a fixed length. This example
//! shows how each pooling mode treats the padding, and how to combine several
//! modes into one concatenated sentence embedding.

use ndarray::array;
use pool_index::{Features, Pooling, PoolingConfig, PoolingMode};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Pooling Example\n");

    // "[CLS] rust is fast [PAD] [PAD]" with 3-dim token vectors
    let tokens = array![
        [0.1, 0.1, 0.1],   // [CLS]
        [0.9, 0.1, 0.0],   // rust
        [0.2, 0.6, 0.2],   // is
        [0.1, 0.2, 0.8],   // fast
        [50.0, 50.0, 50.0], // [PAD]
        [50.0, 50.0, 50.0], // [PAD]
    ];
    let features =
        Features::new().with_attention_mask_bools(&[true, true, true, true, false, false]);

    for mode in PoolingMode::ALL {
        let pooling = match Pooling::new(3, [mode]) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("{mode}: {e}");
                continue;
            }
        };
        match pooling.pool(tokens.view(), &features) {
            Ok(v) => println!("  {:<22} {:.3}", mode.name(), v),
            Err(e) => eprintln!("  {mode}: {e}"),
        }
    }

    println!("\nPadding rows hold 50.0; none of the outputs above should.\n");

    // Same thing, driven by named flags as they appear in a model config
    let config = PoolingConfig::from_flags(
        3,
        [
            ("pooling_mode_cls_token", true),
            ("pooling_mode_mean_tokens", true),
            ("pooling_mode_lasttoken", true), // unknown here, ignored
        ],
    );
    let pooling = match config.build() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("config: {e}");
            return;
        }
    };

    let mut outputs = Vec::new();
    if let Err(e) = pooling.apply(&mut outputs, tokens.view(), &features) {
        eprintln!("apply: {e}");
        return;
    }
    println!(
        "Active modes: {:?} ({} vectors, {} dims concatenated)",
        pooling.modes(),
        outputs.len(),
        pooling.output_dimension()
    );
}
