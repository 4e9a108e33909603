use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("no active catalog package named '{name}' is available for renewal")]
    CatalogMismatch { name: String },

    #[error("purchase {id} already exists")]
    AlreadyExists { id: String },

    #[error("partial write for purchase {id} was rolled back: {reason}")]
    PartialWrite { id: String, reason: String },

    #[error("purchase {id} left in an inconsistent state: {reason}")]
    Inconsistent { id: String, reason: String },

    #[error("transient repository error: {0}")]
    Transient(String),

    #[error("repository error: {0}")]
    Repository(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("configuration error for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("missing required configuration field: {field}")]
    MissingConfigError { field: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Caller mistake: bad id, bad name, bad configuration. Not retryable.
    Low,
    /// Transient infrastructure problem; the whole operation may be retried.
    Medium,
    /// Operation failed and was rolled back or never started.
    High,
    /// Stored data may be inconsistent; operator reconciliation needed.
    Critical,
}

impl EngineError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EngineError::NotFound { .. }
            | EngineError::CatalogMismatch { .. }
            | EngineError::AlreadyExists { .. }
            | EngineError::ConfigValidationError { .. }
            | EngineError::InvalidConfigValueError { .. }
            | EngineError::MissingConfigError { .. } => ErrorSeverity::Low,
            EngineError::Transient(_) => ErrorSeverity::Medium,
            EngineError::PartialWrite { .. }
            | EngineError::Repository(_)
            | EngineError::IoError(_)
            | EngineError::SerializationError(_) => ErrorSeverity::High,
            EngineError::Inconsistent { .. } => ErrorSeverity::Critical,
        }
    }

    /// Whether re-running the whole operation is safe. Never true for a
    /// partially-acknowledged write; the caller should re-submit with the
    /// same purchase intent id instead.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Transient(_))
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EngineError::NotFound { entity, id } => {
                format!("Could not find {} '{}'.", entity, id)
            }
            EngineError::CatalogMismatch { name } => format!(
                "The package '{}' is no longer offered and cannot be renewed. \
                 Pick a package from the current catalog instead.",
                name
            ),
            EngineError::AlreadyExists { id } => {
                format!("Purchase '{}' was already recorded.", id)
            }
            EngineError::Inconsistent { id, .. } => format!(
                "Purchase '{}' may be half-written; please contact support before retrying.",
                id
            ),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.severity() {
            ErrorSeverity::Low => "Check the identifier or configuration value and try again.",
            ErrorSeverity::Medium => "Retry the operation once connectivity recovers.",
            ErrorSeverity::High => "No data was committed; the operation can be re-submitted.",
            ErrorSeverity::Critical => "Reconcile the stored rows manually before retrying.",
        }
    }
}
