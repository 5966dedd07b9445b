//! Simulation knobs, read from the `[simulation]` table

use std::time::Duration;

use blueprint_core::errors::{BlueprintError, Result};
use blueprint_core::JobStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Delay before `request_generation` answers
    pub request_latency_ms: u64,
    /// Delay between two job stages
    pub stage_delay_ms: u64,
    /// A non-failed job younger than this is reused for the same engagement
    pub reuse_window_secs: u64,
    /// Stage in which the job fails instead of advancing
    pub fail_at: Option<JobStatus>,
    /// Error message recorded on the failed job
    pub failure_message: String,
    /// When set, every request is rejected with this message
    pub request_failure: Option<String>,
    /// Prefix of the download URLs attached to generated files
    pub download_base_url: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            request_latency_ms: 150,
            stage_delay_ms: 750,
            reuse_window_secs: 300,
            fail_at: None,
            failure_message: "Blueprint renderer crashed".to_string(),
            request_failure: None,
            download_base_url: "https://storage.blueprints.local".to_string(),
        }
    }
}

impl SimulationConfig {
    /// No latency anywhere; used by tests and dry runs
    pub fn instant() -> Self {
        Self {
            request_latency_ms: 0,
            stage_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn request_latency(&self) -> Duration {
        Duration::from_millis(self.request_latency_ms)
    }

    pub fn stage_delay(&self) -> Duration {
        Duration::from_millis(self.stage_delay_ms)
    }

    pub fn reuse_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.reuse_window_secs).unwrap_or(i64::MAX))
    }

    /// Parse the table body
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the TOML does not parse or fails [`Self::validate`].
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// `InvalidConfig` when `fail_at` is not a stage a job can fail in.
    pub fn validate(&self) -> Result<()> {
        if let Some(stage) = self.fail_at {
            if !is_failable(stage) {
                return Err(BlueprintError::InvalidConfig {
                    reason: format!(
                        "fail_at must be one of processing, rendered, export_pending, bundled (got {})",
                        stage
                    ),
                });
            }
        }
        if self.failure_message.trim().is_empty() {
            return Err(BlueprintError::InvalidConfig {
                reason: "failure_message must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

/// Stages that can be followed by `failed`
pub fn is_failable(stage: JobStatus) -> bool {
    !stage.is_terminal() && stage.stage_index().is_some()
}
