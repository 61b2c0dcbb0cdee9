//! Engine configuration loaded from `faultline.toml`.
//!
//! Every section is `#[serde(default)]`, so a partial file (or none at all)
//! yields a working configuration.

pub mod events_config;
pub mod observability_config;
pub mod reconcile_config;
pub mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use events_config::EventsConfig;
pub use observability_config::ObservabilityConfig;
pub use reconcile_config::{AbsentFieldPolicy, ReconcileConfig};
pub use storage_config::StorageConfig;

use crate::clock::ClockPolicy;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FaultlineConfig {
    /// Authoritative clock for every "latest" and range decision.
    pub clock: ClockPolicy,
    /// Optional path to a TOML fault registry. Built-in table when absent.
    pub registry_path: Option<String>,
    pub storage: StorageConfig,
    pub reconcile: ReconcileConfig,
    pub events: EventsConfig,
    pub observability: ObservabilityConfig,
}

impl FaultlineConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        ::tracing::debug!(path = %path.display(), clock = %config.clock, "Loaded faultline config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.events.max_rows == 0 {
            return Err(ConfigError::Invalid {
                field: "events.max_rows",
                reason: "must be at least 1".into(),
            });
        }
        if self.reconcile.budget_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "reconcile.budget_ms",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
