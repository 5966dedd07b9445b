use serde::Serialize;

use super::job::{BlueprintId, BlueprintJob, JobStatus};

/// Client-side lifecycle of one request key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorStatus {
    Idle,
    Requesting,
    Watching,
    Ready,
    Error,
}

impl OrchestratorStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrchestratorStatus::Ready | OrchestratorStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestratorStatus::Idle => "idle",
            OrchestratorStatus::Requesting => "requesting",
            OrchestratorStatus::Watching => "watching",
            OrchestratorStatus::Ready => "ready",
            OrchestratorStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for OrchestratorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What applying a snapshot did to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// Non-terminal snapshot stored, still watching
    Progressed,
    /// `succeeded` snapshot moved the state to ready
    Completed,
    /// `failed` snapshot moved the state to error
    Failed,
    /// State was not watching (already terminal, or no job requested)
    Ignored,
}

/// Read-only view handed to the presentation layer
///
/// `status == Ready` exactly when the stored job succeeded; `status == Error`
/// exactly when the input was rejected, the request failed or the job failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorState {
    pub status: OrchestratorStatus,
    pub job: Option<BlueprintJob>,
    pub job_id: Option<BlueprintId>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self::idle()
    }
}

impl OrchestratorState {
    pub fn idle() -> Self {
        Self {
            status: OrchestratorStatus::Idle,
            job: None,
            job_id: None,
            error: None,
            elapsed_ms: 0,
        }
    }

    /// Fresh state for a cycle whose request is in flight
    pub fn requesting() -> Self {
        Self {
            status: OrchestratorStatus::Requesting,
            ..Self::idle()
        }
    }

    /// Fresh state for a cycle rejected before any call was made
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            status: OrchestratorStatus::Error,
            error: Some(message.into()),
            ..Self::idle()
        }
    }

    /// `requesting → watching`
    pub fn start_watching(&mut self, job_id: BlueprintId) -> bool {
        if self.status != OrchestratorStatus::Requesting {
            return false;
        }
        self.status = OrchestratorStatus::Watching;
        self.job_id = Some(job_id);
        true
    }

    /// `requesting → error`
    pub fn request_failed(&mut self, message: impl Into<String>) -> bool {
        if self.status != OrchestratorStatus::Requesting {
            return false;
        }
        self.status = OrchestratorStatus::Error;
        self.error = Some(message.into());
        true
    }

    /// Apply one subscription snapshot while watching
    ///
    /// Snapshots are stored whole ("keep latest"); nothing is merged or
    /// reordered. Once the state is terminal further snapshots are ignored.
    pub fn apply_snapshot(
        &mut self,
        job: BlueprintJob,
        failure_fallback: &str,
    ) -> SnapshotOutcome {
        if self.status != OrchestratorStatus::Watching {
            return SnapshotOutcome::Ignored;
        }

        let outcome = match job.status {
            JobStatus::Succeeded => {
                self.status = OrchestratorStatus::Ready;
                SnapshotOutcome::Completed
            }
            JobStatus::Failed => {
                self.status = OrchestratorStatus::Error;
                self.error = Some(
                    job.error_message()
                        .unwrap_or(failure_fallback)
                        .to_string(),
                );
                SnapshotOutcome::Failed
            }
            _ => SnapshotOutcome::Progressed,
        };
        self.job = Some(job);
        outcome
    }

    pub fn job_status(&self) -> Option<JobStatus> {
        self.job.as_ref().map(|job| job.status)
    }
}
