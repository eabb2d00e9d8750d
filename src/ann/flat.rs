use std::borrow::Cow;
use std::cmp::Ordering;

use ndarray::{Array2, ArrayView1, ArrayView2};
use tracing::info;

use super::{AnnIndex, AsEmbeddings, Embeddings, Metric, Neighbors};
use crate::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Index handle
// ─────────────────────────────────────────────────────────────────────────────

/// Brute-force index: the fitted matrix plus its metric.
///
/// Immutable once built. Every query scans all rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    metric: Metric,
    data: Array2<f32>,
}

impl FlatIndex {
    /// Build over `data`, one item per row.
    #[must_use]
    pub fn new(metric: Metric, data: ArrayView2<'_, f32>) -> Self {
        Self {
            metric,
            data: data.as_standard_layout().into_owned(),
        }
    }

    /// Metric used for ranking.
    #[inline]
    #[must_use]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Vector width.
    #[inline]
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.data.ncols()
    }

    /// Number of stored rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// Whether no rows are stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// The stored matrix.
    #[must_use]
    pub fn data(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    /// Top-`k` `(index, value)` for one query, best first.
    ///
    /// `k` is clamped to [`FlatIndex::len`]. Ties go to the lower index and
    /// NaN scores rank after every number.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] if `query.len()` differs from the index.
    pub fn search_one(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        self.check_width(query.len())?;
        Ok(self.rank(query, k))
    }

    /// Top-`k` neighbors for every row of `queries`.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] if query width differs from the index.
    pub fn search(&self, queries: ArrayView2<'_, f32>, k: usize) -> Result<Neighbors> {
        self.check_width(queries.ncols())?;

        let k = k.min(self.len());
        let mut distances = Array2::zeros((queries.nrows(), k));
        let mut indices = Array2::zeros((queries.nrows(), k));

        for (q, query) in queries.rows().into_iter().enumerate() {
            let hits = with_slice(query, |v| self.rank(v, k));
            for (j, (idx, dist)) in hits.into_iter().enumerate() {
                indices[[q, j]] = idx;
                distances[[q, j]] = dist;
            }
        }

        Ok(Neighbors { distances, indices })
    }

    fn check_width(&self, found: usize) -> Result<()> {
        if found == self.dimension() {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.dimension(),
                found,
            })
        }
    }

    fn rank(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let metric = self.metric;
        let mut scored: Vec<(usize, f32)> = self
            .data
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| (i, with_slice(row, |r| metric.evaluate(query, r))))
            .collect();

        let k = k.min(scored.len());
        // NaN sign is platform-dependent, so it is ranked before `total_cmp` sees it.
        let by_rank = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            a.1.is_nan()
                .cmp(&b.1.is_nan())
                .then_with(|| metric.rank_key(a.1).total_cmp(&metric.rank_key(b.1)))
                .then(a.0.cmp(&b.0))
        };
        if k < scored.len() {
            scored.select_nth_unstable_by(k, by_rank);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_rank);
        scored
    }
}

fn with_slice<R>(row: ArrayView1<'_, f32>, f: impl FnOnce(&[f32]) -> R) -> R {
    let slice = row
        .as_slice()
        .map_or_else(|| Cow::Owned(row.to_vec()), Cow::Borrowed);
    f(&slice)
}

// ─────────────────────────────────────────────────────────────────────────────
// Fit/query wrapper
// ─────────────────────────────────────────────────────────────────────────────

/// Flat index with a fit-then-query lifecycle.
///
/// The metric is named at construction and resolved at [`FlatAnn::fit`], so an
/// unknown name surfaces as a configuration error from `fit`.
///
/// ```rust
/// use pool_index::{ann::FlatAnn, Error};
///
/// let ann = FlatAnn::new("IP");
/// assert_eq!(ann.query(&vec![1.0f32, 0.0], 1).unwrap_err(), Error::NotFitted);
/// ```
#[derive(Debug, Clone)]
pub struct FlatAnn {
    index_type: String,
    index: Option<FlatIndex>,
}

impl Default for FlatAnn {
    fn default() -> Self {
        Self::with_metric(Metric::L2)
    }
}

impl FlatAnn {
    /// Unfit wrapper for the metric named `index_type` (`"L2"` or `"IP"`).
    #[must_use]
    pub fn new(index_type: impl Into<String>) -> Self {
        Self {
            index_type: index_type.into(),
            index: None,
        }
    }

    /// Unfit wrapper for a known metric.
    #[must_use]
    pub fn with_metric(metric: Metric) -> Self {
        Self::new(metric.as_str())
    }

    /// Metric name as configured.
    #[must_use]
    pub fn index_type(&self) -> &str {
        &self.index_type
    }

    /// Whether `fit` has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.index.is_some()
    }

    /// The fitted index, if any.
    #[must_use]
    pub fn index(&self) -> Option<&FlatIndex> {
        self.index.as_ref()
    }

    /// The fitted embedding matrix, if any.
    #[must_use]
    pub fn embeddings(&self) -> Option<ArrayView2<'_, f32>> {
        self.index.as_ref().map(FlatIndex::data)
    }

    /// Vector width of the fitted index.
    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.index.as_ref().map(FlatIndex::dimension)
    }

    /// Number of fitted rows (0 when unfit).
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.as_ref().map_or(0, FlatIndex::len)
    }

    /// Whether there is nothing to search.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build the index over `embeddings`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if `embeddings` is not a 2-D matrix
    /// - [`Error::UnknownMetric`] if the configured name is not `L2` or `IP`
    ///
    /// On error the previous state is kept.
    pub fn fit<E: AsEmbeddings + ?Sized>(&mut self, embeddings: &E) -> Result<()> {
        self.fit_embeddings(embeddings.as_embeddings()?)
    }

    /// k nearest fitted rows for a vector or a batch of row vectors.
    ///
    /// A single vector is treated as a `(1, dim)` batch. `n_neighbors` is
    /// clamped to the number of fitted rows.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFitted`] before a successful `fit`
    /// - [`Error::InvalidInput`] if `embedding` is neither a vector nor a matrix
    /// - [`Error::DimensionMismatch`] if the width differs from the fitted matrix
    pub fn query<E: AsEmbeddings + ?Sized>(
        &self,
        embedding: &E,
        n_neighbors: usize,
    ) -> Result<Neighbors> {
        if self.index.is_none() {
            return Err(Error::NotFitted);
        }
        self.query_embeddings(embedding.as_embeddings()?, n_neighbors)
    }

    fn fit_embeddings(&mut self, embeddings: Embeddings<'_>) -> Result<()> {
        info!(index_type = %self.index_type, "start fit flat index");
        let matrix = embeddings.into_matrix()?;
        let metric: Metric = self.index_type.parse()?;

        let index = FlatIndex::new(metric, matrix.view());
        info!(
            metric = %metric,
            dim = index.dimension(),
            rows = index.len(),
            "fitted flat index"
        );
        self.index = Some(index);
        Ok(())
    }

    fn query_embeddings(&self, embedding: Embeddings<'_>, n_neighbors: usize) -> Result<Neighbors> {
        let index = self.index.as_ref().ok_or(Error::NotFitted)?;
        info!(n_neighbors, "query flat index");
        let rows = embedding.into_rows();
        index.search(rows.view(), n_neighbors)
    }
}

impl AnnIndex for FlatAnn {
    fn fit(&mut self, embeddings: Embeddings<'_>) -> Result<()> {
        self.fit_embeddings(embeddings)
    }

    fn query(&self, embedding: Embeddings<'_>, n_neighbors: usize) -> Result<Neighbors> {
        self.query_embeddings(embedding, n_neighbors)
    }

    fn is_fitted(&self) -> bool {
        self.index.is_some()
    }
}
