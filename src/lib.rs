//! # pool-index
//!
//! Token pooling and exact nearest-neighbor search for embedding pipelines.
//!
//! ## Modules
//!
//! | Module | Purpose | Notes |
//! |--------|---------|-------|
//! | [`pooling`] | Tokens → sentence vector | CLS, max, mean, mean-√len, weighted mean |
//! | [`ann`] | k-NN over a fitted matrix | Flat (brute-force), `L2` / `IP` |
//! | [`features`] | Per-call feature bag | Attention mask |
//! | [`config`] | TOML/JSON settings | serde |
//! | [`simd`] | Vector kernels (AVX2/NEON) | Auto-dispatch |
//!
//! The two halves are independent: pooling turns encoder output into one
//! vector per example, the flat index answers nearest-neighbor queries over
//! such vectors.
//!
//! ```text
//! encoder ─▶ token embeddings + mask ─▶ Pooling ─▶ sentence vectors ─▶ FlatAnn
//! ```
//!
//! ## Quick Example
//!
//! ```rust
//! use ndarray::{array, Array2};
//! use pool_index::{ann::FlatAnn, Features, Pooling, PoolingMode};
//!
//! let pooling = Pooling::new(2, [PoolingMode::MeanTokens]).unwrap();
//! let docs = [
//!     array![[1.0, 0.0], [0.8, 0.2]],
//!     array![[0.0, 1.0], [0.1, 0.9]],
//! ];
//!
//! let mut rows = Vec::new();
//! for tokens in &docs {
//!     rows.push(pooling.pool(tokens.view(), &Features::new()).unwrap().to_vec());
//! }
//!
//! let mut ann = FlatAnn::new("IP");
//! ann.fit(&rows).unwrap();
//! let hits = ann.query(&vec![1.0f32, 0.0], 1).unwrap();
//! assert_eq!(hits.indices[[0, 0]], 0);
//! ```

pub mod ann;
pub mod config;
mod error;
pub mod features;
pub mod pooling;
pub mod simd;

pub use ann::{AnnIndex, FlatAnn, FlatIndex, Metric, Neighbors};
pub use config::{Config, IndexConfig};
pub use error::{Error, Result};
pub use features::Features;
pub use pooling::{Pooling, PoolingConfig, PoolingMode};
