//! Top-level configuration file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use whiff_api::RecommenderConfig;
use whiff_classifier::TrainingConfig;

/// Everything tunable, as read from `--config`
///
/// Absent sections and fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiffConfig {
    pub training: TrainingConfig,
    pub recommender: RecommenderConfig,
}

impl WhiffConfig {
    /// Load and validate a JSON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config: WhiffConfig = whiff_storage::load_json(path)?;
        config
            .validate()
            .with_context(|| format!("invalid config in {}", path.display()))?;
        Ok(config)
    }

    /// Defaults when no path is given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> whiff_core::Result<()> {
        self.training.validate()?;
        self.recommender.validate()
    }
}
