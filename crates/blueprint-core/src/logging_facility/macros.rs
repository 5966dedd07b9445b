//! Canonical logging macros
//!
//! Every macro stamps `component`, `op` and `event` so captured events can be
//! matched without parsing messages.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use blueprint_core::log_op_start;
/// log_op_start!("submit");
/// log_op_start!("submit", engagement_id = "acme-1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::blueprint_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::blueprint_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use blueprint_core::log_op_end;
/// log_op_end!("request_generation", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::blueprint_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::blueprint_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// The error is converted into an [`ExError`](crate::errors::ExError) so the
/// stable code is always present on the event.
///
/// # Example
///
/// ```
/// # use blueprint_core::{log_op_error, errors::BlueprintError};
/// let err = BlueprintError::RequestFailed { message: "network down".to_string() };
/// log_op_error!("request_generation", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        use $crate::errors::ExError;
        let ex_err: ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::blueprint_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            message = ex_err.message(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        use $crate::errors::ExError;
        let ex_err: ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::blueprint_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            message = ex_err.message(),
            $($field)*
        );
    }};
}

/// Log an orchestrator state transition
///
/// # Example
///
/// ```
/// # use blueprint_core::log_transition;
/// log_transition!("requesting", "watching", cycle = 3u64);
/// ```
#[macro_export]
macro_rules! log_transition {
    ($from:expr, $to:expr) => {
        tracing::debug!(
            component = module_path!(),
            op = "transition",
            event = $crate::blueprint_core_types::schema::EVENT_TRANSITION,
            from = $from,
            to = $to,
        );
    };
    ($from:expr, $to:expr, $($field:tt)*) => {
        tracing::debug!(
            component = module_path!(),
            op = "transition",
            event = $crate::blueprint_core_types::schema::EVENT_TRANSITION,
            from = $from,
            to = $to,
            $($field)*
        );
    };
}
