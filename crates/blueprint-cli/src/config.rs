//! Host configuration file
//!
//! ```toml
//! [orchestrator]
//! tick_interval_ms = 500
//!
//! [simulation]
//! stage_delay_ms = 250
//! fail_at = "bundled"
//! ```

use std::path::Path;

use blueprint_core::config::load_toml;
use blueprint_core::{OrchestratorConfig, Result};
use blueprint_sim::SimulationConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub orchestrator: OrchestratorConfig,
    pub simulation: SimulationConfig,
}

impl AppConfig {
    /// Read and validate the file at `path`
    ///
    /// # Errors
    ///
    /// `Io` when the file cannot be read, `InvalidConfig` when it does not
    /// parse or validate.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = load_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// `load` when a path was given, defaults otherwise
    ///
    /// # Errors
    ///
    /// As [`AppConfig::load`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// # Errors
    ///
    /// `InvalidConfig` naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        self.orchestrator.validate()?;
        self.simulation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_core::{BlueprintError, JobStatus};
    use std::io::Write;

    fn parse(source: &str) -> Result<AppConfig> {
        let config: AppConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_empty_source_is_default() {
        assert_eq!(parse("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_tables_are_read() {
        let config = parse(
            r#"
            [orchestrator]
            ticker_enabled = false

            [simulation]
            stage_delay_ms = 10
            fail_at = "export_pending"
            "#,
        )
        .unwrap();

        assert!(config.orchestrator.tick_interval().is_none());
        assert_eq!(config.simulation.stage_delay_ms, 10);
        assert_eq!(config.simulation.fail_at, Some(JobStatus::ExportPending));
        assert_eq!(config.simulation.request_latency_ms, 150);
    }

    #[test]
    fn test_unknown_table_rejected() {
        let err = parse("[server]\nport = 1\n").unwrap_err();
        assert!(matches!(err, BlueprintError::InvalidConfig { .. }));
    }

    #[test]
    fn test_terminal_fail_at_rejected() {
        let err = parse("[simulation]\nfail_at = \"succeeded\"\n").unwrap_err();
        assert!(matches!(err, BlueprintError::InvalidConfig { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[simulation]\nrequest_latency_ms = 0").unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.simulation.request_latency_ms, 0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = AppConfig::load_or_default(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, BlueprintError::Io { .. }));
    }

    #[test]
    fn test_no_path_uses_defaults() {
        assert_eq!(AppConfig::load_or_default(None).unwrap(), AppConfig::default());
    }
}
