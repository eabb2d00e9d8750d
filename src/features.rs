//! Per-call auxiliary inputs for pooling.
//!
//! [`Features`] is a small feature bag: named arrays produced alongside the
//! token embeddings (attention mask, token type ids, ...). Pooling only reads
//! the attention mask; other entries are carried for callers that share one bag
//! across pipeline stages.
//!
//! ```rust
//! use pool_index::Features;
//!
//! let features = Features::new().with_attention_mask_bools(&[true, true, false]);
//! let mask = features.attention_mask().unwrap().unwrap();
//! assert_eq!(mask.len(), 3);
//! ```

use std::collections::HashMap;

use ndarray::{Array, Array1, ArrayD, ArrayView1, Dimension};

use crate::{Error, Result};

/// Key under which the attention mask is stored.
pub const ATTENTION_MASK: &str = "attention_mask";

/// Named arrays accompanying one input example.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    values: HashMap<String, ArrayD<f32>>,
}

impl Features {
    /// Empty feature bag. Pooling treats every token as valid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an array under `name`, replacing any previous value.
    pub fn insert<D: Dimension>(&mut self, name: impl Into<String>, value: Array<f32, D>) {
        self.values.insert(name.into(), value.into_dyn());
    }

    /// Builder form of [`Features::insert`] for the attention mask.
    ///
    /// Accepts 1-D `(seq_len)` masks and 2-D masks with one singleton axis.
    #[must_use]
    pub fn with_attention_mask<D: Dimension>(mut self, mask: Array<f32, D>) -> Self {
        self.insert(ATTENTION_MASK, mask);
        self
    }

    /// Attention mask from booleans (`true` = real token).
    #[must_use]
    pub fn with_attention_mask_bools(self, mask: &[bool]) -> Self {
        let mask: Array1<f32> = mask.iter().map(|&m| if m { 1.0 } else { 0.0 }).collect();
        self.with_attention_mask(mask)
    }

    /// Raw access by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.values.get(name)
    }

    /// Whether a value is stored under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// The attention mask flattened to one value per token.
    ///
    /// Returns `Ok(None)` when no mask is present.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] when the mask has more than one non-singleton
    /// axis or more than two axes.
    pub fn attention_mask(&self) -> Result<Option<ArrayView1<'_, f32>>> {
        let Some(mask) = self.values.get(ATTENTION_MASK) else {
            return Ok(None);
        };

        let non_singleton = mask.shape().iter().filter(|&&d| d != 1).count();
        if mask.ndim() == 0 || mask.ndim() > 2 || non_singleton > 1 {
            return Err(Error::InvalidInput {
                expected: "1-D attention mask or 2-D mask with a singleton axis",
                found: format!("mask of shape {:?}", mask.shape()),
            });
        }

        let len = mask.len();
        mask.view()
            .into_shape_with_order(len)
            .map(Some)
            .map_err(|e| Error::InvalidInput {
                expected: "contiguous attention mask",
                found: e.to_string(),
            })
    }
}
