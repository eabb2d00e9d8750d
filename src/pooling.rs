//! Token pooling: reduce a (tokens × dim) matrix to sentence-level vectors.
//!
//! A [`Pooling`] instance is configured once with an embedding dimension and a
//! set of active [`PoolingMode`]s. Each call to [`Pooling::apply`] appends one
//! vector per active mode, always in registration order:
//!
//! | Mode | Output |
//! |------|--------|
//! | `cls_token` | First token, unchanged |
//! | `max_tokens` | Element-wise max over valid tokens |
//! | `mean_tokens` | Σ valid / max(n_valid, 1) |
//! | `mean_sqrt_len_tokens` | Σ valid / √max(n_valid, 1) |
//! | `weighted_mean_tokens` | Σ pos·token / max(Σ pos, 1), pos is 1-based |
//!
//! Validity comes from the attention mask in [`Features`]; any non-zero entry
//! marks a real token. Without a mask every token counts.
//!
//! ## Example
//!
//! ```rust
//! use ndarray::array;
//! use pool_index::{Features, Pooling, PoolingMode};
//!
//! let pooling = Pooling::new(2, [PoolingMode::ClsToken, PoolingMode::MeanTokens]).unwrap();
//! let tokens = array![[1.0, 2.0], [3.0, 4.0], [0.0, 0.0]];
//! let features = Features::new().with_attention_mask_bools(&[true, true, false]);
//!
//! let mut out = Vec::new();
//! pooling.apply(&mut out, tokens.view(), &features).unwrap();
//!
//! assert_eq!(out[0], array![1.0, 2.0]); // CLS
//! assert_eq!(out[1], array![2.0, 3.0]); // mean over the 2 real tokens
//! ```

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, ArrayView2, Zip};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Features, Result};

/// Value substituted for padding positions before max pooling.
pub const MAX_POOL_SENTINEL: f32 = -1e9;

/// Prefix accepted in front of flag names (`pooling_mode_mean_tokens`).
const FLAG_PREFIX: &str = "pooling_mode_";

// ─────────────────────────────────────────────────────────────────────────────
// Modes
// ─────────────────────────────────────────────────────────────────────────────

/// A single pooling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolingMode {
    /// First token embedding.
    ClsToken,
    /// Element-wise maximum over valid tokens.
    MaxTokens,
    /// Arithmetic mean over valid tokens.
    MeanTokens,
    /// Sum over valid tokens divided by the square root of their count.
    MeanSqrtLenTokens,
    /// Position-weighted mean over valid tokens.
    WeightedMeanTokens,
}

impl PoolingMode {
    /// All modes in registration order.
    pub const ALL: [Self; 5] = [
        Self::ClsToken,
        Self::MaxTokens,
        Self::MeanTokens,
        Self::MeanSqrtLenTokens,
        Self::WeightedMeanTokens,
    ];

    /// Flag name of this mode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ClsToken => "cls_token",
            Self::MaxTokens => "max_tokens",
            Self::MeanTokens => "mean_tokens",
            Self::MeanSqrtLenTokens => "mean_sqrt_len_tokens",
            Self::WeightedMeanTokens => "weighted_mean_tokens",
        }
    }

    /// Reduce `tokens` given per-row validity.
    ///
    /// `valid.len()` must equal the number of rows.
    fn pool(self, tokens: ArrayView2<'_, f32>, valid: &[bool]) -> Result<Array1<f32>> {
        debug_assert_eq!(tokens.nrows(), valid.len());
        match self {
            Self::ClsToken => cls(tokens),
            Self::MaxTokens => max(tokens, valid),
            Self::MeanTokens => {
                let (sum, count) = weighted_sum(tokens, valid, |_| 1.0);
                Ok(sum / count.max(1.0))
            }
            Self::MeanSqrtLenTokens => {
                let (sum, count) = weighted_sum(tokens, valid, |_| 1.0);
                Ok(sum / count.max(1.0).sqrt())
            }
            Self::WeightedMeanTokens => {
                let (sum, total_weight) = weighted_sum(tokens, valid, |i| (i + 1) as f32);
                Ok(sum / total_weight.max(1.0))
            }
        }
    }
}

impl fmt::Display for PoolingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PoolingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.strip_prefix(FLAG_PREFIX).unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| Error::Config(format!("unknown pooling mode {s:?}")))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Strategies
// ─────────────────────────────────────────────────────────────────────────────

fn cls(tokens: ArrayView2<'_, f32>) -> Result<Array1<f32>> {
    if tokens.nrows() == 0 {
        return Err(Error::EmptySequence);
    }
    Ok(tokens.row(0).to_owned())
}

fn max(tokens: ArrayView2<'_, f32>, valid: &[bool]) -> Result<Array1<f32>> {
    if tokens.nrows() == 0 {
        return Err(Error::EmptySequence);
    }
    let mut out = Array1::from_elem(tokens.ncols(), f32::NEG_INFINITY);
    for (row, &is_valid) in tokens.rows().into_iter().zip(valid) {
        if is_valid {
            Zip::from(&mut out).and(&row).for_each(|o, &x| *o = o.max(x));
        } else {
            out.mapv_inplace(|o| o.max(MAX_POOL_SENTINEL));
        }
    }
    Ok(out)
}

/// Σ weight(i)·row_i over valid rows, plus Σ weight(i) over the same rows.
fn weighted_sum(
    tokens: ArrayView2<'_, f32>,
    valid: &[bool],
    weight: impl Fn(usize) -> f32,
) -> (Array1<f32>, f32) {
    let mut sum = Array1::zeros(tokens.ncols());
    let mut total = 0.0;
    for (i, (row, _)) in tokens
        .rows()
        .into_iter()
        .zip(valid)
        .enumerate()
        .filter(|&(_, (_, &v))| v)
    {
        let w = weight(i);
        sum.scaled_add(w, &row);
        total += w;
    }
    (sum, total)
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Serializable pooling settings: one flag per mode.
///
/// Unknown keys are ignored when deserializing, and every flag defaults to
/// `false`. Flags also accept the `pooling_mode_` prefixed spelling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolingConfig {
    /// Width of each token embedding (and of each pooled vector).
    pub word_embedding_dimension: usize,
    /// Enable [`PoolingMode::ClsToken`].
    #[serde(alias = "pooling_mode_cls_token")]
    pub cls_token: bool,
    /// Enable [`PoolingMode::MaxTokens`].
    #[serde(alias = "pooling_mode_max_tokens")]
    pub max_tokens: bool,
    /// Enable [`PoolingMode::MeanTokens`].
    #[serde(alias = "pooling_mode_mean_tokens")]
    pub mean_tokens: bool,
    /// Enable [`PoolingMode::MeanSqrtLenTokens`].
    #[serde(alias = "pooling_mode_mean_sqrt_len_tokens")]
    pub mean_sqrt_len_tokens: bool,
    /// Enable [`PoolingMode::WeightedMeanTokens`].
    #[serde(alias = "pooling_mode_weighted_mean_tokens")]
    pub weighted_mean_tokens: bool,
}

impl PoolingConfig {
    /// Config with no active modes.
    #[must_use]
    pub const fn new(word_embedding_dimension: usize) -> Self {
        Self {
            word_embedding_dimension,
            cls_token: false,
            max_tokens: false,
            mean_tokens: false,
            mean_sqrt_len_tokens: false,
            weighted_mean_tokens: false,
        }
    }

    /// Build from named boolean flags. Unrecognized names are ignored.
    #[must_use]
    pub fn from_flags<'a>(
        word_embedding_dimension: usize,
        flags: impl IntoIterator<Item = (&'a str, bool)>,
    ) -> Self {
        flags
            .into_iter()
            .filter_map(|(name, on)| name.parse::<PoolingMode>().ok().map(|m| (m, on)))
            .fold(Self::new(word_embedding_dimension), |cfg, (mode, on)| {
                cfg.with_mode_set(mode, on)
            })
    }

    /// Enable a mode.
    #[must_use]
    pub const fn with_mode(self, mode: PoolingMode) -> Self {
        self.with_mode_set(mode, true)
    }

    /// Set a mode's flag.
    #[must_use]
    pub const fn with_mode_set(mut self, mode: PoolingMode, on: bool) -> Self {
        match mode {
            PoolingMode::ClsToken => self.cls_token = on,
            PoolingMode::MaxTokens => self.max_tokens = on,
            PoolingMode::MeanTokens => self.mean_tokens = on,
            PoolingMode::MeanSqrtLenTokens => self.mean_sqrt_len_tokens = on,
            PoolingMode::WeightedMeanTokens => self.weighted_mean_tokens = on,
        }
        self
    }

    /// Whether `mode` is switched on.
    #[must_use]
    pub const fn is_enabled(&self, mode: PoolingMode) -> bool {
        match mode {
            PoolingMode::ClsToken => self.cls_token,
            PoolingMode::MaxTokens => self.max_tokens,
            PoolingMode::MeanTokens => self.mean_tokens,
            PoolingMode::MeanSqrtLenTokens => self.mean_sqrt_len_tokens,
            PoolingMode::WeightedMeanTokens => self.weighted_mean_tokens,
        }
    }

    /// Active modes in registration order.
    pub fn enabled_modes(&self) -> impl Iterator<Item = PoolingMode> + '_ {
        PoolingMode::ALL.into_iter().filter(|&m| self.is_enabled(m))
    }

    /// Construct the aggregator.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if `word_embedding_dimension` is zero.
    pub fn build(&self) -> Result<Pooling> {
        Pooling::new(self.word_embedding_dimension, self.enabled_modes())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregator
// ─────────────────────────────────────────────────────────────────────────────

/// Applies a fixed set of pooling modes to token embeddings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pooling {
    dimension: usize,
    modes: Vec<PoolingMode>,
}

impl Pooling {
    /// Create an aggregator for `dimension`-wide tokens.
    ///
    /// Modes are deduplicated and kept in registration order regardless of the
    /// order given.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if `dimension` is zero.
    pub fn new(dimension: usize, modes: impl IntoIterator<Item = PoolingMode>) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::Config(
                "word_embedding_dimension must be greater than zero".to_string(),
            ));
        }
        let mut modes: Vec<PoolingMode> = modes.into_iter().collect();
        modes.sort_unstable();
        modes.dedup();
        Ok(Self { dimension, modes })
    }

    /// Create from named boolean flags; unknown names are ignored.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if `dimension` is zero.
    pub fn from_flags<'a>(
        dimension: usize,
        flags: impl IntoIterator<Item = (&'a str, bool)>,
    ) -> Result<Self> {
        PoolingConfig::from_flags(dimension, flags).build()
    }

    /// Configured token width.
    #[inline]
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Active modes, registration order.
    #[inline]
    #[must_use]
    pub fn modes(&self) -> &[PoolingMode] {
        &self.modes
    }

    /// Length of the concatenated output of [`Pooling::pool`].
    #[inline]
    #[must_use]
    pub fn output_dimension(&self) -> usize {
        self.dimension * self.modes.len()
    }

    /// Equivalent serializable config.
    #[must_use]
    pub fn config(&self) -> PoolingConfig {
        self.modes
            .iter()
            .fold(PoolingConfig::new(self.dimension), |cfg, &m| cfg.with_mode(m))
    }

    /// Append one pooled vector per active mode to `output`.
    ///
    /// `token_embeddings` is `(seq_len, dimension)`. Neither input is modified,
    /// and nothing is appended if any mode fails.
    ///
    /// # Errors
    ///
    /// - [`Error::DimensionMismatch`] if the token width differs from the configured dimension
    /// - [`Error::ShapeMismatch`] if the attention mask length differs from `seq_len`
    /// - [`Error::InvalidInput`] if the attention mask is not 1-D
    /// - [`Error::EmptySequence`] for CLS or max pooling over zero tokens
    pub fn apply(
        &self,
        output: &mut Vec<Array1<f32>>,
        token_embeddings: ArrayView2<'_, f32>,
        features: &Features,
    ) -> Result<()> {
        let (seq_len, width) = token_embeddings.dim();
        if width != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                found: width,
            });
        }

        let valid = valid_tokens(seq_len, features)?;
        debug!(
            seq_len,
            valid = valid.iter().filter(|&&v| v).count(),
            modes = self.modes.len(),
            "applying pooling"
        );

        let pooled = self
            .modes
            .iter()
            .map(|mode| mode.pool(token_embeddings, &valid))
            .collect::<Result<Vec<_>>>()?;
        output.extend(pooled);
        Ok(())
    }

    /// Run every active mode and concatenate the results into one vector of
    /// length [`Pooling::output_dimension`].
    ///
    /// # Errors
    ///
    /// Same as [`Pooling::apply`].
    pub fn pool(
        &self,
        token_embeddings: ArrayView2<'_, f32>,
        features: &Features,
    ) -> Result<Array1<f32>> {
        let mut parts = Vec::with_capacity(self.modes.len());
        self.apply(&mut parts, token_embeddings, features)?;
        Ok(parts.iter().flat_map(|p| p.iter().copied()).collect())
    }
}

fn valid_tokens(seq_len: usize, features: &Features) -> Result<Vec<bool>> {
    match features.attention_mask()? {
        None => Ok(vec![true; seq_len]),
        Some(mask) if mask.len() == seq_len => Ok(mask.iter().map(|&m| m != 0.0).collect()),
        Some(mask) => Err(Error::ShapeMismatch {
            tokens: seq_len,
            mask: mask.len(),
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────


#[cfg(test)]
mod proptests {
    use super::*;
    use ndarray::Array2;
    use proptest::prelude::*;

    fn arb_tokens() -> impl Strategy<Value = Array2<f32>> {
        (1usize..8, 1usize..6).prop_flat_map(|(n, d)| {
            proptest::collection::vec(-10.0f32..10.0, n * d)
                .prop_map(move |v| Array2::from_shape_vec((n, d), v).unwrap())
        })
    }

    fn arb_tokens_and_mask() -> impl Strategy<Value = (Array2<f32>, Vec<bool>)> {
        arb_tokens().prop_flat_map(|t| {
            let n = t.nrows();
            (Just(t), proptest::collection::vec(any::<bool>(), n))
        })
    }

    proptest! {
        /// Every active mode yields a vector of the configured width
        #[test]
        fn outputs_have_configured_width((tokens, mask) in arb_tokens_and_mask()) {
            let pooling = Pooling::new(tokens.ncols(), PoolingMode::ALL).unwrap();
            let f = Features::new().with_attention_mask_bools(&mask);
            let mut out = Vec::new();
            pooling.apply(&mut out, tokens.view(), &f).unwrap();
            prop_assert_eq!(out.len(), 5);
            for v in &out {
                prop_assert_eq!(v.len(), tokens.ncols());
                prop_assert!(v.iter().all(|x| x.is_finite()));
            }
        }

        /// An all-ones mask behaves exactly like no mask
        #[test]
        fn all_ones_mask_equals_no_mask(tokens in arb_tokens()) {
            let pooling = Pooling::new(tokens.ncols(), PoolingMode::ALL).unwrap();
            let ones = Features::new().with_attention_mask_bools(&vec![true; tokens.nrows()]);
            let a = pooling.pool(tokens.view(), &ones).unwrap();
            let b = pooling.pool(tokens.view(), &Features::new()).unwrap();
            prop_assert_eq!(a, b);
        }

        /// Mean and max stay within the range of the valid tokens
        #[test]
        fn mean_bounded_by_valid_extremes((tokens, mask) in arb_tokens_and_mask()) {
            prop_assume!(mask.iter().any(|&m| m));
            let f = Features::new().with_attention_mask_bools(&mask);
            let pooling = Pooling::new(
                tokens.ncols(),
                [PoolingMode::MaxTokens, PoolingMode::MeanTokens],
            ).unwrap();
            let mut out = Vec::new();
            pooling.apply(&mut out, tokens.view(), &f).unwrap();
            let (max, mean) = (&out[0], &out[1]);
            for d in 0..tokens.ncols() {
                let col_min = tokens.column(d).iter().zip(&mask)
                    .filter(|&(_, &m)| m).map(|(&x, _)| x).fold(f32::INFINITY, f32::min);
                prop_assert!(mean[d] <= max[d] + 1e-4);
                prop_assert!(mean[d] >= col_min - 1e-4);
            }
        }
    }
}
