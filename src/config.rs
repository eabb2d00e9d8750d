//! Loading pooling and index settings from TOML or JSON.
//!
//! Both documents share one layout, so a pipeline can keep its settings in a
//! single file:
//!
//! ```toml
//! [pooling]
//! word_embedding_dimension = 384
//! mean_tokens = true
//!
//! [index]
//! metric = "IP"
//! ```
//!
//! Missing sections fall back to their defaults (no pooling modes, `L2`).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ann::FlatAnn;
use crate::pooling::PoolingConfig;
use crate::{Error, Result};

/// Settings for the flat index wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Metric name, `"L2"` or `"IP"`. Validated at fit time.
    #[serde(alias = "index_type")]
    pub metric: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            metric: "L2".to_string(),
        }
    }
}

impl IndexConfig {
    /// Unfit wrapper using this metric name.
    #[must_use]
    pub fn build(&self) -> FlatAnn {
        FlatAnn::new(self.metric.clone())
    }
}

/// Combined settings document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pooling section.
    pub pooling: PoolingConfig,
    /// Index section.
    pub index: IndexConfig,
}

impl Config {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] on malformed TOML.
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] on malformed JSON.
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the file cannot be read, has another extension,
    /// or does not parse.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "loading config");
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&text),
            Some("json") => Self::from_json(&text),
            other => Err(Error::Config(format!(
                "unsupported config extension {other:?} for {}",
                path.display()
            ))),
        }
    }

    /// Serialize as TOML.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }
}
