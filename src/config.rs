use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::derive::{FieldDeriver, SeededGenderLabeler};

/// Environment variable naming an optional JSON configuration file.
pub const CONFIG_ENV: &str = "MARKETING_LENS_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("histogram_bins must be at least 1")]
    NoHistogramBins,
}

/// Constants fixed for the lifetime of a loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Year that ages are computed against.
    pub reference_year: i32,
    /// Seed for the synthetic gender labels.
    pub label_seed: u64,
    /// Number of bins in the age histogram.
    pub histogram_bins: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            reference_year: 2025,
            label_seed: 42,
            histogram_bins: 20,
        }
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.histogram_bins == 0 {
            return Err(ConfigError::NoHistogramBins);
        }
        Ok(())
    }

    /// Read a JSON config file. Absent keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: DashboardConfig =
            serde_json::from_str(&text).context("parsing config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by [`CONFIG_ENV`], or fall back to defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                let config = Self::load(Path::new(&path))?;
                log::info!("Loaded config from {}", Path::new(&path).display());
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// The field deriver these settings describe.
    pub fn deriver(&self) -> FieldDeriver<SeededGenderLabeler> {
        FieldDeriver::new(self.reference_year, SeededGenderLabeler::new(self.label_seed))
    }
}
