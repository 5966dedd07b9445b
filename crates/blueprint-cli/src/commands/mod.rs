//! CLI command implementations

pub mod console;
pub mod generate;

use std::sync::Arc;

use blueprint_core::blueprint_core_types::TraceId;
use blueprint_core::render::{status_badge, status_message};
use blueprint_core::{
    GenerationRequest, JobStatus, Orchestrator, OrchestratorConfig, OrchestratorState,
    OrchestratorStatus, Result,
};
use blueprint_sim::{EngagementCatalog, SimulatedBlueprintService};
use clap::Args;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;

use crate::config::AppConfig;

/// Request flags shared by `generate` and the console's `blueprint`
#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    /// Engagement to generate the blueprint for
    pub engagement_id: String,

    /// Executive tone (default: the configured tone)
    #[arg(long)]
    pub tone: Option<String>,

    /// Win to emphasize (repeatable)
    #[arg(long = "win", value_name = "TEXT")]
    pub wins: Vec<String>,

    /// Risk to emphasize (repeatable)
    #[arg(long = "risk", value_name = "TEXT")]
    pub risks: Vec<String>,

    /// Roadmap item to emphasize (repeatable)
    #[arg(long = "roadmap", value_name = "TEXT")]
    pub roadmap: Vec<String>,
}

impl RequestArgs {
    pub fn to_request(&self, config: &OrchestratorConfig) -> GenerationRequest {
        let tone = self
            .tone
            .clone()
            .unwrap_or_else(|| config.default_executive_tone.clone());

        GenerationRequest::new(self.engagement_id.clone())
            .with_tone(tone)
            .with_wins(self.wins.iter().cloned())
            .with_risks(self.risks.iter().cloned())
            .with_roadmap(self.roadmap.iter().cloned())
    }
}

/// Orchestrator wired to a simulated service over the demo catalog
///
/// Every cycle of one CLI session shares a fresh trace id.
///
/// # Errors
///
/// `RuntimeUnavailable` outside a tokio runtime, `InvalidConfig` when either
/// table does not validate.
pub fn simulated_orchestrator(config: &AppConfig) -> Result<Orchestrator> {
    let service = Arc::new(SimulatedBlueprintService::new(
        config.simulation.clone(),
        EngagementCatalog::demo(),
    )?);
    let trace_id = TraceId::new();
    tracing::debug!(component = module_path!(), trace_id = %trace_id, "session started");
    Ok(Orchestrator::new(service.clone(), service, config.orchestrator.clone())?
        .with_trace_id(trace_id))
}

/// Print one line per status change until the state settles
///
/// Elapsed-time ticks alone do not print. Returns the settled state, which is
/// terminal unless the orchestrator went back to idle.
///
/// # Errors
///
/// `Io` when `out` cannot be written.
pub async fn follow_progress<W>(
    mut rx: watch::Receiver<OrchestratorState>,
    out: &mut W,
) -> Result<OrchestratorState>
where
    W: AsyncWrite + Unpin,
{
    let mut shown: Option<(OrchestratorStatus, Option<JobStatus>)> = None;

    loop {
        let state = rx.borrow_and_update().clone();
        let marker = (state.status, state.job_status());
        if shown != Some(marker) {
            let line = format!("{} {}\n", status_badge(state.status), status_message(&state));
            out.write_all(line.as_bytes()).await?;
            out.flush().await?;
            shown = Some(marker);
        }

        if state.status.is_terminal() || state.status == OrchestratorStatus::Idle {
            return Ok(state);
        }
        if rx.changed().await.is_err() {
            return Ok(state);
        }
    }
}
