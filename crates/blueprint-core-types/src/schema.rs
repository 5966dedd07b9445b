//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names consistent between the orchestrator,
//! the simulated service and the CLI.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Entity identifiers
pub const FIELD_ENGAGEMENT_ID: &str = "engagement_id";
pub const FIELD_BLUEPRINT_ID: &str = "blueprint_id";
pub const FIELD_REQUEST_KEY: &str = "request_key";
pub const FIELD_CYCLE: &str = "cycle";

// Lifecycle
pub const FIELD_FROM_STATUS: &str = "from";
pub const FIELD_TO_STATUS: &str = "to";
pub const FIELD_JOB_STATUS: &str = "job_status";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_TRANSITION: &str = "transition";
pub const EVENT_STALE_DISCARD: &str = "stale_discard";
pub const EVENT_DEDUPLICATED: &str = "deduplicated";
