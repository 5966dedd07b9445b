use crate::model::{BlueprintJob, JobStatus, OrchestratorState, OrchestratorStatus};

/// A downloadable deliverable of a finished job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverableLink {
    pub label: &'static str,
    pub url: String,
}

/// Human-readable phrase for the current state
///
/// In `error` the stored message is returned verbatim; every other state maps
/// to a fixed phrase keyed on the latest job status.
pub fn status_message(state: &OrchestratorState) -> String {
    let phrase = match state.status {
        OrchestratorStatus::Idle => "Waiting for engagement input",
        OrchestratorStatus::Requesting => "Submitting blueprint request...",
        OrchestratorStatus::Error => {
            return state
                .error
                .clone()
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| crate::errors::DEFAULT_JOB_FAILURE_MESSAGE.to_string());
        }
        OrchestratorStatus::Watching | OrchestratorStatus::Ready => match state.job_status() {
            None => "Initializing...",
            Some(JobStatus::Processing) => "Processing engagement context with AI...",
            Some(JobStatus::Rendered) => "PDF rendered - preparing bundle...",
            Some(JobStatus::ExportPending) => "Publishing artifact bundle...",
            Some(JobStatus::Bundled) => "Bundle ready - exporting analytics...",
            Some(JobStatus::Succeeded) => "Blueprint generation complete!",
            Some(JobStatus::Failed) | Some(JobStatus::Unknown) => "Generating blueprint...",
        },
    };
    phrase.to_string()
}

/// Progress bar value: 10 until the first snapshot, then by stage
pub fn progress_percent(state: &OrchestratorState) -> u8 {
    match state.job_status() {
        Some(JobStatus::Processing) => 30,
        Some(JobStatus::Rendered) => 60,
        Some(JobStatus::ExportPending) => 80,
        Some(JobStatus::Bundled) => 95,
        Some(JobStatus::Succeeded) => 100,
        _ => 10,
    }
}

pub fn status_badge(status: OrchestratorStatus) -> &'static str {
    match status {
        OrchestratorStatus::Idle => "[IDLE]",
        OrchestratorStatus::Requesting => "[REQUESTING]",
        OrchestratorStatus::Watching => "[GENERATING]",
        OrchestratorStatus::Ready => "[READY]",
        OrchestratorStatus::Error => "[ERROR]",
    }
}

/// PDF and artifact bundle links, in that order, when the job carries them
pub fn deliverable_links(job: &BlueprintJob) -> Vec<DeliverableLink> {
    let mut links = Vec::new();
    if let Some(url) = job.pdf_url() {
        links.push(DeliverableLink {
            label: "Download PDF",
            url: url.to_string(),
        });
    }
    if let Some(url) = job.bundle_url() {
        links.push(DeliverableLink {
            label: "Download Artifact Bundle",
            url: url.to_string(),
        });
    }
    links
}

fn percent(ratio: f64) -> i64 {
    (ratio * 100.0).round() as i64
}

/// Multi-line status card for terminals and logs
pub fn render_status_card(state: &OrchestratorState) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{} {}\n",
        status_badge(state.status),
        status_message(state)
    ));

    if matches!(
        state.status,
        OrchestratorStatus::Requesting | OrchestratorStatus::Watching | OrchestratorStatus::Ready
    ) {
        output.push_str(&format!(
            "Progress: {}% ({}s elapsed)\n",
            progress_percent(state),
            state.elapsed_ms / 1_000
        ));
    }

    if let Some(job_id) = &state.job_id {
        output.push_str(&format!("Blueprint: {}\n", job_id));
    }

    let Some(job) = &state.job else {
        return output;
    };

    if let Some(customer) = &job.customer_name {
        output.push_str(&format!("Customer: {}\n", customer));
    }

    let links = deliverable_links(job);
    if !links.is_empty() {
        output.push('\n');
        for link in &links {
            output.push_str(&format!("{}: {}\n", link.label, link.url));
        }
    }

    if let Some(analytics) = &job.analytics {
        output.push_str("\nAnalytics Summary\n");
        output.push_str(&format!(
            "  Recommendation coverage: {}%\n",
            percent(analytics.recommendation_coverage)
        ));
        output.push_str(&format!(
            "  Automation confidence: {}%\n",
            percent(analytics.automation_confidence)
        ));
        output.push_str(&format!("  Risk score: {}%\n", percent(analytics.risk_score)));
        output.push_str(&format!("  Scenarios: {}\n", analytics.scenario_count));
        output.push_str(&format!("  Notes: {}\n", analytics.notes_count));
        if !analytics.recommendation_categories.is_empty() {
            output.push_str(&format!(
                "  Categories: {}\n",
                analytics.recommendation_categories.join(", ")
            ));
        }
    }

    let timeline = job.timeline();
    if !timeline.is_empty() {
        output.push_str("\nTimeline\n");
        for event in timeline {
            output.push_str(&format!(
                "  {} [{}] {}\n",
                event.at.format("%Y-%m-%d %H:%M"),
                event.kind,
                event.summary
            ));
        }
    }

    output
}
