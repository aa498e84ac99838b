//! Engine configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file is valid:
//!
//! ```toml
//! retention_days = 30
//! sleep_period_days = 7
//! prune_step_accumulator = true
//! ```

use crate::error::TelemetryError;
use crate::sleep::DEFAULT_SLEEP_PERIOD_DAYS;
use crate::store::DEFAULT_RETENTION_DAYS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Days of raw samples kept by [`crate::engine::TelemetryEngine::prune_expired`]
    pub retention_days: u32,
    /// Number of recent sleep records summarized by default
    pub sleep_period_days: usize,
    /// Drop per-day step totals together with their observations
    pub prune_step_accumulator: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            sleep_period_days: DEFAULT_SLEEP_PERIOD_DAYS,
            prune_step_accumulator: true,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(toml: &str) -> Result<Self, TelemetryError> {
        let config: Self =
            toml::from_str(toml).map_err(|e| TelemetryError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, TelemetryError> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        log::debug!("loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TelemetryError> {
        if self.retention_days == 0 {
            return Err(TelemetryError::ConfigError(
                "retention_days must be at least 1".to_string(),
            ));
        }
        if self.sleep_period_days == 0 {
            return Err(TelemetryError::ConfigError(
                "sleep_period_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
