use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque job identifier assigned by the generation service
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlueprintId(String);

impl BlueprintId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlueprintId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlueprintId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BlueprintId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Server-side lifecycle of a blueprint job
///
/// Updates for one job arrive in stage order; `Failed` can follow any
/// non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Rendered,
    ExportPending,
    Bundled,
    Succeeded,
    Failed,
    /// Any status this client does not know; treated as in progress
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Happy-path order of the service stages
    pub const PIPELINE: [JobStatus; 5] = [
        JobStatus::Processing,
        JobStatus::Rendered,
        JobStatus::ExportPending,
        JobStatus::Bundled,
        JobStatus::Succeeded,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    /// Position in the pipeline, `None` for `Failed` and `Unknown`
    pub fn stage_index(&self) -> Option<usize> {
        Self::PIPELINE.iter().position(|stage| stage == self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Rendered => "rendered",
            JobStatus::ExportPending => "export_pending",
            JobStatus::Bundled => "bundled",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        }
    }

    /// Parse the wire name of a status (`"export_pending"`, `"bundled"`, ...)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "processing" => Some(JobStatus::Processing),
            "rendered" => Some(JobStatus::Rendered),
            "export_pending" => Some(JobStatus::ExportPending),
            "bundled" => Some(JobStatus::Bundled),
            "succeeded" => Some(JobStatus::Succeeded),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated file (PDF or artifact bundle)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintFile {
    pub storage_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
}

/// Domain content summary produced in the processing stage
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintPayload {
    #[serde(default)]
    pub storage_path: Option<String>,
    #[serde(default)]
    pub sections: Option<u32>,
    #[serde(default)]
    pub executive_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
}

/// Analytics attached once the export completes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintAnalytics {
    pub recommendation_coverage: f64,
    pub risk_score: f64,
    pub automation_confidence: f64,
    #[serde(default)]
    pub recommendation_categories: Vec<String>,
    pub scenario_count: u32,
    pub notes_count: u32,
    pub transcript_tokens: u64,
    #[serde(default)]
    pub delivery_latency_ms: Option<u64>,
    #[serde(default)]
    pub last_exported_at: Option<DateTime<Utc>>,
}

/// Error reported by a failed job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    pub message: String,
}

/// One entry of the engagement timeline captured with the job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub at: DateTime<Utc>,
    pub kind: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContextSnapshot {
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
}

/// Snapshot of a server-owned blueprint job
///
/// Written only by the generation service; the orchestrator observes and
/// stores whole snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintJob {
    pub id: BlueprintId,
    pub engagement_id: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payload: Option<BlueprintPayload>,
    #[serde(default)]
    pub pdf: Option<BlueprintFile>,
    #[serde(default)]
    pub artifact_bundle: Option<BlueprintFile>,
    #[serde(default)]
    pub analytics: Option<BlueprintAnalytics>,
    #[serde(default)]
    pub error: Option<JobError>,
    #[serde(default)]
    pub context_snapshot: Option<ContextSnapshot>,
}

impl BlueprintJob {
    /// Minimal snapshot carrying only an id, engagement and status
    pub fn new(id: BlueprintId, engagement_id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id,
            engagement_id: engagement_id.into(),
            customer_name: None,
            status,
            generated_at: None,
            payload: None,
            pdf: None,
            artifact_bundle: None,
            analytics: None,
            error: None,
            context_snapshot: None,
        }
    }

    pub fn pdf_url(&self) -> Option<&str> {
        self.pdf.as_ref().and_then(|f| f.download_url.as_deref())
    }

    pub fn bundle_url(&self) -> Option<&str> {
        self.artifact_bundle
            .as_ref()
            .and_then(|f| f.download_url.as_deref())
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .map(|e| e.message.as_str())
            .filter(|m| !m.trim().is_empty())
    }

    pub fn timeline(&self) -> &[TimelineEvent] {
        self.context_snapshot
            .as_ref()
            .map(|c| c.timeline.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order() {
        let indices: Vec<_> = JobStatus::PIPELINE
            .iter()
            .map(|s| s.stage_index().unwrap())
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(JobStatus::Failed.stage_index(), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Bundled.is_terminal());
        assert!(!JobStatus::Unknown.is_terminal());
    }

    #[test]
    fn test_unknown_status_deserializes() {
        let status: JobStatus = serde_json::from_str("\"queued\"").unwrap();
        assert_eq!(status, JobStatus::Unknown);
        let status: JobStatus = serde_json::from_str("\"export_pending\"").unwrap();
        assert_eq!(status, JobStatus::ExportPending);
    }

    #[test]
    fn test_parse_matches_wire_names() {
        for status in JobStatus::PIPELINE {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("failed"), Some(JobStatus::Failed));
        assert_eq!(JobStatus::parse("nope"), None);
    }

    #[test]
    fn test_job_from_service_json() {
        let json = r#"{
            "id": "bp-1",
            "engagementId": "acme-1",
            "status": "succeeded",
            "pdf": { "storagePath": "a/b.pdf", "downloadUrl": "https://x/pdf" }
        }"#;
        let job: BlueprintJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.id.as_str(), "bp-1");
        assert_eq!(job.pdf_url(), Some("https://x/pdf"));
        assert_eq!(job.bundle_url(), None);
        assert!(job.timeline().is_empty());
    }

    #[test]
    fn test_blank_error_message_is_absent() {
        let mut job = BlueprintJob::new("bp-1".into(), "acme-1", JobStatus::Failed);
        job.error = Some(JobError {
            message: "  ".to_string(),
        });
        assert_eq!(job.error_message(), None);
    }
}
