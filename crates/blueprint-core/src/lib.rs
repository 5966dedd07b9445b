//! Blueprint Core - engagement blueprint generation orchestrator
//!
//! This crate owns the client side of blueprint generation:
//! - Request and job models mirroring the generation service records
//! - Deterministic request keys used to de-duplicate submissions
//! - Collaborator traits for submitting jobs and streaming their status
//! - The orchestration state machine, its cycle cancellation and ticker
//! - Text rendering of the orchestrator state
//!
//! The generation service itself (PDF rendering, analytics) lives behind
//! [`service::GenerationRequester`] and [`service::StatusSubscriber`].

pub mod config;
pub mod errors;
pub mod key;
pub mod logging_facility;
pub mod model;
pub mod orchestrator;
pub mod render;
pub mod service;

// Used by the exported logging macros
pub use blueprint_core_types;

// Re-export commonly used types
pub use config::OrchestratorConfig;
pub use errors::{BlueprintError, ExError, ExErrorKind, Result};
pub use key::{build_key, RequestKey};
pub use model::{
    BlueprintId, BlueprintJob, GenerationRequest, JobStatus, OrchestratorState,
    OrchestratorStatus,
};
pub use orchestrator::{CycleHandle, Orchestrator, SubmitOutcome};
pub use service::{
    GenerationRequester, GenerationTicket, StatusSubscriber, Subscription, SubscriptionGate,
    UpdateCallback,
};
