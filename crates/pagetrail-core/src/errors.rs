use pagetrail_core_types::RequestId;
use thiserror::Error;

/// Result type alias using HistoryError
pub type Result<T> = std::result::Result<T, HistoryError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers can match on and
/// surface in external responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Validation
    InvalidInput,

    // Access. NotFound is used both for "does not exist" and for
    // "exists but belongs to another page" and must read the same.
    NotFound,
    Unauthorized,

    // History
    /// A stored version document is missing required sections or fails its digest
    CorruptedSnapshot,
    /// An audit log entry carries a diff payload that cannot be decoded
    MalformedDiff,

    // Integration/IO
    Serialization,
    Persistence,
    Concurrency,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Unauthorized => "ERR_UNAUTHORIZED",
            ExErrorKind::CorruptedSnapshot => "ERR_CORRUPTED_SNAPSHOT",
            ExErrorKind::MalformedDiff => "ERR_MALFORMED_DIFF",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus context for
/// debugging: the failing operation, the entity and the request id.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
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
            request_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
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
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain errors raised by the pure history kernel
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    /// Collection name is not one of the known collections
    #[error("Unknown collection: {name}")]
    UnknownCollection { name: String },

    /// A stored version document is missing sections or has an unknown format
    #[error("Corrupted snapshot: {reason}")]
    CorruptedSnapshot { reason: String },

    /// A diff payload does not decode into any known shape
    #[error("Malformed diff payload: {reason}")]
    MalformedDiff { reason: String },

    /// Configuration document failed to parse or validate
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Caller supplied data the kernel cannot work with
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<HistoryError> for ExError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::UnknownCollection { name } => ExError::new(ExErrorKind::InvalidInput)
                .with_message(format!("Unknown collection: {}", name)),
            HistoryError::CorruptedSnapshot { reason } => {
                ExError::new(ExErrorKind::CorruptedSnapshot).with_message(reason)
            }
            HistoryError::MalformedDiff { reason } => {
                ExError::new(ExErrorKind::MalformedDiff).with_message(reason)
            }
            HistoryError::InvalidConfig { reason } => ExError::new(ExErrorKind::InvalidInput)
                .with_op("load_config")
                .with_message(reason),
            HistoryError::InvalidInput { reason } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(reason)
            }
            HistoryError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(err: serde_json::Error) -> Self {
        HistoryError::Serialization {
            message: err.to_string(),
        }
    }
}
