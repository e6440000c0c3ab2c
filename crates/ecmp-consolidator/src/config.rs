//! Configuration file support for the ECMP group consolidator.
//!
//! Loads and validates configuration from TOML files.
//! Default location: /etc/sonic/ecmp_consolidator.toml

use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ConsolidatorError, Result};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sonic/ecmp_consolidator.toml";

/// Consolidator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatorConfig {
    /// Gate for the whole consolidator; when off no group state is held.
    #[serde(default = "default_consolidate_ecmp_groups")]
    pub consolidate_ecmp_groups: bool,

    /// Hardware limit on distinct ECMP groups. Exceeding it is logged only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ecmp_groups: Option<u32>,
}

fn default_consolidate_ecmp_groups() -> bool {
    false
}

impl Default for ConsolidatorConfig {
    fn default() -> Self {
        Self {
            consolidate_ecmp_groups: default_consolidate_ecmp_groups(),
            max_ecmp_groups: None,
        }
    }
}

impl ConsolidatorConfig {
    /// Creates an enabled configuration with no group limit.
    pub fn enabled() -> Self {
        Self {
            consolidate_ecmp_groups: true,
            ..Self::default()
        }
    }

    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let config: Self = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConsolidatorError::Config(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Config file {} not found, using defaults",
                    path.display()
                );
                Self::default()
            }
            Err(e) => return Err(ConsolidatorError::Io(e)),
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            ConsolidatorError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_ecmp_groups == Some(0) {
            return Err(ConsolidatorError::Config(
                "max_ecmp_groups must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
