//! Exact nearest-neighbor search over a fitted embedding matrix.
//!
//! "ANN" is the interface name; the only backend here is [`FlatIndex`], a
//! brute-force index that compares every query against every stored row.
//!
//! | Metric | Ranking | Reported value |
//! |--------|---------|----------------|
//! | [`Metric::L2`] | ascending | squared Euclidean distance |
//! | [`Metric::Ip`] | descending | inner product |
//!
//! ## Example
//!
//! ```rust
//! use ndarray::array;
//! use pool_index::ann::FlatAnn;
//!
//! let mut ann = FlatAnn::new("L2");
//! ann.fit(&array![[0.0f32, 0.0], [1.0, 0.0], [5.0, 5.0]]).unwrap();
//!
//! let hits = ann.query(&vec![0.9f32, 0.1], 2).unwrap();
//! assert_eq!(hits.indices.row(0).to_vec(), vec![1, 0]);
//! ```

mod flat;
pub mod input;

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{simd, Error, Result};

pub use flat::{FlatAnn, FlatIndex};
pub use input::{AsEmbeddings, Embeddings};

// ─────────────────────────────────────────────────────────────────────────────
// Metric
// ─────────────────────────────────────────────────────────────────────────────

/// Distance metric of a flat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Squared Euclidean distance, smaller is better.
    #[serde(rename = "L2")]
    L2,
    /// Inner product, larger is better.
    #[serde(rename = "IP")]
    Ip,
}

impl Metric {
    /// Name as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::L2 => "L2",
            Self::Ip => "IP",
        }
    }

    /// Raw value between two vectors: distance for L2, similarity for IP.
    #[inline]
    #[must_use]
    pub fn evaluate(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::L2 => simd::squared_l2(a, b),
            Self::Ip => simd::dot(a, b),
        }
    }

    /// Key under which results sort ascending (best first).
    #[inline]
    pub(crate) fn rank_key(self, value: f32) -> f32 {
        match self {
            Self::L2 => value,
            Self::Ip => -value,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "L2" => Ok(Self::L2),
            "IP" => Ok(Self::Ip),
            other => Err(Error::UnknownMetric(other.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────────────────────────────────────

/// k-nearest-neighbor results for a batch of queries.
///
/// Both arrays are `(n_queries, k)`; row `i` holds query `i`'s neighbors,
/// best first. `indices` point into the fitted embedding matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbors {
    /// Squared L2 distances or inner-product scores.
    pub distances: Array2<f32>,
    /// Row indices into the fitted matrix.
    pub indices: Array2<usize>,
}

impl Neighbors {
    /// Number of queries.
    #[must_use]
    pub fn n_queries(&self) -> usize {
        self.indices.nrows()
    }

    /// Neighbors per query.
    #[must_use]
    pub fn k(&self) -> usize {
        self.indices.ncols()
    }

    /// `(index, distance)` pairs of query `i`, best first.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_queries()`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indices
            .row(i)
            .into_iter()
            .copied()
            .zip(self.distances.row(i).into_iter().copied())
    }

    /// Split into `(distances, indices)`.
    #[must_use]
    pub fn into_parts(self) -> (Array2<f32>, Array2<usize>) {
        (self.distances, self.indices)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A fit-then-query nearest-neighbor index.
///
/// Implementors start unfit; [`AnnIndex::query`] before [`AnnIndex::fit`] is
/// [`Error::NotFitted`]. Fitting again replaces the previous contents.
pub trait AnnIndex {
    /// Build the index over a `(n_items, dim)` matrix.
    ///
    /// # Errors
    ///
    /// Implementation-defined; see [`FlatAnn::fit`].
    fn fit(&mut self, embeddings: Embeddings<'_>) -> Result<()>;

    /// k nearest neighbors of one vector or a batch of row vectors.
    ///
    /// # Errors
    ///
    /// Implementation-defined; see [`FlatAnn::query`].
    fn query(&self, embedding: Embeddings<'_>, n_neighbors: usize) -> Result<Neighbors>;

    /// Whether `fit` has succeeded at least once.
    fn is_fitted(&self) -> bool;
}
