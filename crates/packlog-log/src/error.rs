use crate::handle::StreamName;

/// Errors from log stream service operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    /// The named stream has no live backing log.
    #[error("stream not found: {0}")]
    NotFound(StreamName),

    /// The log or coordination service could not be reached.
    #[error("log service unavailable: {0}")]
    Unavailable(String),

    /// A handle was used outside its contract (wrong mode, already closed).
    #[error("bad stream handle {handle}: {reason}")]
    BadHandle { handle: u64, reason: String },
}

/// Result alias for log stream operations.
pub type LogResult<T> = std::result::Result<T, LogError>;
