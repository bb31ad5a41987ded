//! Service configuration loading.
//!
//! A config file is YAML (`.yaml`, `.yml`) or JSON (`.json`):
//!
//! ```yaml
//! dim: 128
//! top_k: 5
//! threshold: 0.4   # Euclidean distance
//! index:
//!   kind: hnsw
//!   m: 16
//!   seed: 7
//! ```

use std::path::Path;

use faceid_gallery::GalleryConfig;
use faceid_vecstore::IndexKind;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Candidates fetched per query when not configured.
pub const DEFAULT_TOP_K: usize = 5;

/// Acceptance threshold when not configured, in Euclidean distance units.
/// Tuned for L2-normalized face descriptors.
pub const DEFAULT_THRESHOLD: f32 = 0.4;

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

/// Settings for a gallery plus the verification defaults applied to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Embedding dimension. Required.
    pub dim: usize,

    /// Candidates requested from the index per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Maximum exact Euclidean distance accepted as a match.
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Index structure behind the gallery.
    #[serde(default)]
    pub index: IndexKind,
}

impl ServiceConfig {
    /// Config with default `top_k`, threshold and a flat index.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_THRESHOLD,
            index: IndexKind::Flat,
        }
    }

    /// Loads and validates a config file, choosing the format by extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read(path)?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        let cfg: ServiceConfig = match ext {
            "json" => serde_json::from_slice(&data)?,
            "yaml" | "yml" => serde_yaml::from_slice(&data)?,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "unsupported config extension {:?} for {}",
                    ext,
                    path.display()
                )));
            }
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(s: &str) -> Result<Self, ConfigError> {
        let cfg: ServiceConfig = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects settings the gallery or verifier cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dim == 0 {
            return Err(ConfigError::Invalid("dim must be positive".into()));
        }
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be positive".into()));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "threshold must be a finite non-negative distance, got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Gallery settings derived from this config.
    pub fn gallery_config(&self) -> GalleryConfig {
        GalleryConfig {
            dim: self.dim,
            index: self.index.clone(),
        }
    }
}
