use blueprint_core_types::RequestId;
use thiserror::Error;

/// Result type alias using BlueprintError
pub type Result<T> = std::result::Result<T, BlueprintError>;

/// Message stored when the engagement id guard rejects a request
pub const MISSING_ENGAGEMENT_MESSAGE: &str = "Engagement ID is required";

/// Fallback message when a failed job carries no error of its own
pub const DEFAULT_JOB_FAILURE_MESSAGE: &str = "Blueprint generation failed";

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable by the console, by tests and
/// by anything that needs to branch on an error without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input
    InvalidInput,
    MissingEngagementId,
    UnknownCommand,

    // Generation lifecycle
    ExternalService,
    JobFailed,
    StaleCycle,

    // Environment
    RuntimeUnavailable,
    InvalidConfig,
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::MissingEngagementId => "ERR_MISSING_ENGAGEMENT_ID",
            ExErrorKind::UnknownCommand => "ERR_UNKNOWN_COMMAND",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::JobFailed => "ERR_JOB_FAILED",
            ExErrorKind::StaleCycle => "ERR_STALE_CYCLE",
            ExErrorKind::RuntimeUnavailable => "ERR_RUNTIME_UNAVAILABLE",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    blueprint_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            blueprint_id: None,
            request_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (engagement id, command name, config path)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_blueprint_id(mut self, id: impl Into<String>) -> Self {
        self.blueprint_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn blueprint_id(&self) -> Option<&str> {
        self.blueprint_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(blueprint_id) = &self.blueprint_id {
            write!(f, " (blueprint_id: {})", blueprint_id)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for blueprint orchestration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlueprintError {
    /// The engagement id was empty or whitespace
    #[error("{}", MISSING_ENGAGEMENT_MESSAGE)]
    MissingEngagementId,

    /// Input rejected by the generation service or the command layer
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The generation request was rejected (network or service failure)
    #[error("Generation request failed: {message}")]
    RequestFailed { message: String },

    /// The job reported `failed`
    #[error("Blueprint {blueprint_id} failed: {message}")]
    JobFailed {
        blueprint_id: String,
        message: String,
    },

    /// A result arrived for a cycle that has been superseded
    #[error("Result for cycle {cycle} arrived after the cycle was superseded")]
    StaleCycle { cycle: u64 },

    /// The orchestrator was created outside an async runtime
    #[error("No async runtime is available to drive generation cycles")]
    RuntimeUnavailable,

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BlueprintError {
    /// Message shown to the user verbatim in the orchestrator state
    ///
    /// Collaborator failures surface their own message ("network down"),
    /// everything else its display form.
    pub fn surface_message(&self) -> String {
        match self {
            BlueprintError::RequestFailed { message } => message.clone(),
            BlueprintError::JobFailed { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<BlueprintError> for ExError {
    fn from(err: BlueprintError) -> Self {
        match err {
            BlueprintError::MissingEngagementId => ExError::new(ExErrorKind::MissingEngagementId)
                .with_message(MISSING_ENGAGEMENT_MESSAGE),

            BlueprintError::InvalidInput { reason } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(reason)
            }

            BlueprintError::RequestFailed { message } => ExError::new(ExErrorKind::ExternalService)
                .with_op("request_generation")
                .with_message(message),

            BlueprintError::JobFailed {
                blueprint_id,
                message,
            } => ExError::new(ExErrorKind::JobFailed)
                .with_blueprint_id(blueprint_id)
                .with_message(message),

            BlueprintError::StaleCycle { cycle } => ExError::new(ExErrorKind::StaleCycle)
                .with_message(format!("cycle {} superseded", cycle)),

            BlueprintError::RuntimeUnavailable => ExError::new(ExErrorKind::RuntimeUnavailable)
                .with_message("No async runtime is available"),

            BlueprintError::InvalidConfig { reason } => {
                ExError::new(ExErrorKind::InvalidConfig).with_message(reason)
            }

            BlueprintError::UnknownCommand { name } => ExError::new(ExErrorKind::UnknownCommand)
                .with_entity_id(name)
                .with_message("Unknown command"),

            BlueprintError::Io { message } => ExError::new(ExErrorKind::Io).with_message(message),

            BlueprintError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            BlueprintError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for BlueprintError {
    fn from(err: serde_json::Error) -> Self {
        BlueprintError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for BlueprintError {
    fn from(err: toml::de::Error) -> Self {
        BlueprintError::InvalidConfig {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for BlueprintError {
    fn from(err: std::io::Error) -> Self {
        BlueprintError::Io {
            message: err.to_string(),
        }
    }
}
