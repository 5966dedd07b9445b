//! Orchestrator configuration
//!
//! Values come from the `[orchestrator]` table of the host's TOML file; every
//! field has a default so an empty table (or no file) is valid.

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{BlueprintError, Result, DEFAULT_JOB_FAILURE_MESSAGE};
use crate::model::DEFAULT_EXECUTIVE_TONE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrchestratorConfig {
    /// Tone used by hosts when the user gives none
    pub default_executive_tone: String,
    /// Elapsed-time ticker period; 0 disables the ticker
    pub tick_interval_ms: u64,
    /// Headless hosts turn the ticker off entirely
    pub ticker_enabled: bool,
    /// Message stored when a failed job carries no error message
    pub job_failure_message: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_executive_tone: DEFAULT_EXECUTIVE_TONE.to_string(),
            tick_interval_ms: 1_000,
            ticker_enabled: true,
            job_failure_message: DEFAULT_JOB_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl OrchestratorConfig {
    /// Configuration for hosts without a timer facility
    pub fn headless() -> Self {
        Self {
            ticker_enabled: false,
            ..Self::default()
        }
    }

    /// Ticker period, `None` when the ticker should not run
    pub fn tick_interval(&self) -> Option<Duration> {
        if self.ticker_enabled && self.tick_interval_ms > 0 {
            Some(Duration::from_millis(self.tick_interval_ms))
        } else {
            None
        }
    }

    /// Parse the table body (`tick_interval_ms = 500` ...)
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_executive_tone.trim().is_empty() {
            return Err(BlueprintError::InvalidConfig {
                reason: "default_executive_tone must not be blank".to_string(),
            });
        }
        if self.job_failure_message.trim().is_empty() {
            return Err(BlueprintError::InvalidConfig {
                reason: "job_failure_message must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

/// Read and deserialize a TOML file
///
/// # Errors
///
/// `Io` when the file cannot be read, `InvalidConfig` when it does not parse.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let source = std::fs::read_to_string(path).map_err(|err| BlueprintError::Io {
        message: format!("{}: {}", path.display(), err),
    })?;
    toml::from_str(&source).map_err(|err| BlueprintError::InvalidConfig {
        reason: format!("{}: {}", path.display(), err),
    })
}
