use std::path::{Path, PathBuf};

use res_core::{EnrichError, Result};
use serde::Deserialize;

const DEFAULT_MAX_MALFORMED_RATIO: f64 = 0.10;

/// Pipeline configuration: input locations, output location, tolerances.
/// Loaded from a TOML file; individual values can be overridden on the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct EnricherConfig {
    pub inputs: InputsConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputsConfig {
    /// SQLite database holding the `geography` reference table.
    pub geography_db: PathBuf,
    /// Directory tree of raw search-event log files.
    pub search_log_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Share of malformed rows tolerated before the batch is rejected.
    #[serde(default = "default_max_malformed_ratio")]
    pub max_malformed_ratio: f64,
}

fn default_max_malformed_ratio() -> f64 {
    DEFAULT_MAX_MALFORMED_RATIO
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_malformed_ratio: DEFAULT_MAX_MALFORMED_RATIO,
        }
    }
}

impl EnricherConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EnrichError::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        let config: EnricherConfig = toml::from_str(&contents)
            .map_err(|e| EnrichError::Config(format!("invalid '{}': {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.limits.max_malformed_ratio) {
            return Err(EnrichError::Config(format!(
                "max_malformed_ratio must be within [0, 1], got {}",
                self.limits.max_malformed_ratio
            )));
        }
        Ok(())
    }
}
