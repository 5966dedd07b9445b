#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use blueprint_core::model::{GenerationRequest, JobStatus, OrchestratorStatus};
use blueprint_core::render::{render_status_card, status_message};
use blueprint_core::{Orchestrator, OrchestratorConfig, SubmitOutcome};
use blueprint_sim::{SimulatedBlueprintService, SimulationConfig};
use common::*;

fn orchestrate(service: &SimulatedBlueprintService, config: OrchestratorConfig) -> Orchestrator {
    let shared = Arc::new(service.clone());
    Orchestrator::new(shared.clone(), shared, config).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_generation_runs_to_ready() {
    let service = service(stepped());
    let mut orchestrator = orchestrate(&service, OrchestratorConfig::default());

    let request = GenerationRequest::new("acme-1")
        .with_wins(["fast POV"])
        .with_risks(["budget freeze"]);
    assert_eq!(orchestrator.submit(&request), SubmitOutcome::Dispatched);

    let state = orchestrator.wait_for_terminal().await;
    assert_eq!(state.status, OrchestratorStatus::Ready);
    assert_eq!(state.job_status(), Some(JobStatus::Succeeded));
    assert_eq!(status_message(&state), "Blueprint generation complete!");
    // Last tick and last stage share the same instant
    assert!((3_000..=4_000).contains(&state.elapsed_ms));

    let card = render_status_card(&state);
    assert!(card.contains("Customer: Acme Financial"));
    assert!(card.contains("Download PDF: "));
    assert!(card.contains("Download Artifact Bundle: "));
}

#[tokio::test(start_paused = true)]
async fn test_job_failure_reaches_error_state() {
    let service = service(SimulationConfig {
        fail_at: Some(JobStatus::Bundled),
        failure_message: "analytics export failed".to_string(),
        ..stepped()
    });
    let mut orchestrator = orchestrate(&service, OrchestratorConfig::default());

    orchestrator.submit(&GenerationRequest::new("acme-1"));
    let state = orchestrator.wait_for_terminal().await;

    assert_eq!(state.status, OrchestratorStatus::Error);
    assert_eq!(state.error.as_deref(), Some("analytics export failed"));
    assert_eq!(state.job_status(), Some(JobStatus::Failed));
}

#[tokio::test(start_paused = true)]
async fn test_request_failure_reaches_error_state() {
    let service = service(SimulationConfig {
        request_failure: Some("network down".to_string()),
        ..stepped()
    });
    let mut orchestrator = orchestrate(&service, OrchestratorConfig::default());

    orchestrator.submit(&GenerationRequest::new("acme-1"));
    let state = orchestrator.wait_for_terminal().await;

    assert_eq!(state.status, OrchestratorStatus::Error);
    assert_eq!(state.error.as_deref(), Some("network down"));
    assert!(state.job.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_switching_engagement_mid_run() {
    let service = service(stepped());
    let mut orchestrator = orchestrate(&service, OrchestratorConfig::headless());

    orchestrator.submit(&GenerationRequest::new("acme-1"));
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(orchestrator.state().job_status(), Some(JobStatus::Rendered));

    orchestrator.submit(&GenerationRequest::new("globex-7"));
    let state = orchestrator.wait_for_terminal().await;

    assert_eq!(state.status, OrchestratorStatus::Ready);
    let job = state.job.unwrap();
    assert_eq!(job.engagement_id, "globex-7");
    assert_eq!(job.customer_name.as_deref(), Some("Globex Logistics"));

    // The first job kept running server-side but was no longer observed
    let first = &service.jobs_for_engagement("acme-1")[0];
    assert_eq!(first.status, JobStatus::Succeeded);
}
