//! Error types.
//!
//! Every fallible operation in this crate returns [`Result`]. Variants map onto
//! three families: input-type errors ([`Error::InvalidInput`]), configuration
//! errors ([`Error::UnknownMetric`], [`Error::Config`]) and state errors
//! ([`Error::NotFitted`]). The remaining variants are shape errors raised by
//! the numeric code.

use thiserror::Error;

/// Errors raised by pooling and index operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Argument is not the expected array kind (wrong rank, ragged rows).
    #[error("invalid input: expected {expected}, found {found}")]
    InvalidInput {
        /// What the operation accepts.
        expected: &'static str,
        /// What was supplied.
        found: String,
    },

    /// Metric name is neither `L2` nor `IP`.
    #[error("unknown metric {0:?}, use \"L2\" or \"IP\"")]
    UnknownMetric(String),

    /// Query issued before `fit`.
    #[error("index not fitted, call fit before querying")]
    NotFitted,

    /// Vector width differs from the configured or fitted dimension.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Configured or fitted dimension.
        expected: usize,
        /// Width of the supplied vectors.
        found: usize,
    },

    /// Attention mask does not line up with the token rows.
    #[error("attention mask length {mask} does not match {tokens} tokens")]
    ShapeMismatch {
        /// Number of token rows.
        tokens: usize,
        /// Number of mask entries.
        mask: usize,
    },

    /// Token sequence has no rows.
    #[error("token sequence is empty")]
    EmptySequence,

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_violated_precondition() {
        assert!(Error::NotFitted.to_string().contains("fit"));
        assert!(Error::UnknownMetric("COSINE".into())
            .to_string()
            .contains("COSINE"));

        let err = Error::ShapeMismatch { tokens: 5, mask: 3 };
        let s = err.to_string();
        assert!(s.contains('5') && s.contains('3'), "got: {s}");
    }

    #[test]
    fn invalid_input_mentions_both_sides() {
        let err = Error::InvalidInput {
            expected: "2-D matrix",
            found: "1-D vector".to_string(),
        };
        let s = err.to_string();
        assert!(s.contains("2-D matrix"));
        assert!(s.contains("1-D vector"));
    }
}
