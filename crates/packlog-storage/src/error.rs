use packlog_log::LogError;
use packlog_types::PathError;

/// Errors from packages storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Malformed or reserved path. Detected locally, never retried.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// The path has no backing stream. Not retried automatically.
    #[error("package not found: {0}")]
    NotFound(String),

    /// Transport/service-level failure from the log or coordination
    /// service. The engine performs no retries; callers may.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Operation invoked before `initialize()` or after `close()`.
    #[error("storage engine not initialized")]
    NotInitialized,

    /// Configuration could not be parsed or validated.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O failure on a caller-supplied content source or output sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

impl From<LogError> for StorageError {
    fn from(err: LogError) -> Self {
        match err {
            LogError::NotFound(name) => StorageError::NotFound(name.to_string()),
            LogError::Unavailable(msg) => StorageError::BackendUnavailable(msg),
            // A handle misuse inside the engine is indistinguishable from a
            // broken service as far as the caller is concerned.
            err @ LogError::BadHandle { .. } => StorageError::BackendUnavailable(err.to_string()),
        }
    }
}
