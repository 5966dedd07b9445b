pub mod job;
pub mod request;
pub mod state;

pub use job::{
    BlueprintAnalytics, BlueprintFile, BlueprintId, BlueprintJob, BlueprintPayload,
    ContextSnapshot, JobError, JobStatus, TimelineEvent,
};
pub use request::{Emphasis, GenerationRequest, DEFAULT_EXECUTIVE_TONE};
pub use state::{OrchestratorState, OrchestratorStatus, SnapshotOutcome};
