//! Generate command
//!
//! Usage: blueprint generate <ENGAGEMENT_ID> [--tone <TONE>] [--win <TEXT>]... [--fail-at <STAGE>]

use std::path::PathBuf;

use blueprint_core::logging_facility::{self, Profile};
use blueprint_core::render::{render_status_card, status_message};
use blueprint_core::{GenerationRequest, JobStatus, OrchestratorState, OrchestratorStatus, Result};
use clap::Args;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::{follow_progress, simulated_orchestrator, RequestArgs};
use crate::config::AppConfig;

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Make the simulated job fail in this stage
    #[arg(long, value_name = "STAGE", value_parser = parse_stage)]
    pub fail_at: Option<JobStatus>,

    /// Delay between simulated job stages
    #[arg(long, value_name = "MS")]
    pub stage_delay_ms: Option<u64>,

    /// TOML file with [orchestrator] and [simulation] tables
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Emit JSON logs on stderr
    #[arg(long)]
    pub json_logs: bool,
}

fn parse_stage(value: &str) -> std::result::Result<JobStatus, String> {
    JobStatus::parse(value).ok_or_else(|| {
        format!(
            "unknown stage '{}' (expected processing, rendered, export_pending or bundled)",
            value
        )
    })
}

/// Execute generate command
///
/// # Errors
///
/// Configuration and runtime errors, or the final error message when the
/// blueprint did not reach `ready`.
pub fn execute(args: GenerateArgs) -> std::result::Result<(), Box<dyn std::error::Error>> {
    logging_facility::init(Profile::from_json_flag(args.json_logs));

    let mut config = AppConfig::load_or_default(args.config.as_deref())?;
    if let Some(stage) = args.fail_at {
        config.simulation.fail_at = Some(stage);
    }
    if let Some(delay) = args.stage_delay_ms {
        config.simulation.stage_delay_ms = delay;
    }
    config.validate()?;

    let request = args.request.to_request(&config.orchestrator);
    let runtime = tokio::runtime::Runtime::new()?;
    let state = runtime.block_on(async {
        let mut stdout = tokio::io::stdout();
        generate(&config, &request, &mut stdout).await
    })?;

    match state.status {
        OrchestratorStatus::Ready => Ok(()),
        _ => Err(status_message(&state).into()),
    }
}

/// Run one generation cycle to completion, printing progress and the final card
///
/// # Errors
///
/// Wiring errors from [`simulated_orchestrator`] and `Io` from `out`. A failed
/// job is not an error here; it is reported in the returned state.
pub async fn generate<W>(
    config: &AppConfig,
    request: &GenerationRequest,
    out: &mut W,
) -> Result<OrchestratorState>
where
    W: AsyncWrite + Unpin,
{
    let mut orchestrator = simulated_orchestrator(config)?;
    let rx = orchestrator.watch();
    orchestrator.submit(request);

    let state = follow_progress(rx, out).await?;
    out.write_all(format!("\n{}", render_status_card(&state)).as_bytes())
        .await?;
    out.flush().await?;
    Ok(state)
}
