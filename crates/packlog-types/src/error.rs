/// Errors from path parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path contains no segments after normalization.
    #[error("path is empty")]
    Empty,

    /// The path contains a character reserved by the stream namespace.
    #[error("path {path:?} contains forbidden character: {ch:?}")]
    ForbiddenCharacter { path: String, ch: char },

    /// A segment is `.`, `..`, or starts with `.`.
    #[error("path {path:?} contains reserved segment: {segment:?}")]
    ReservedSegment { path: String, segment: String },
}

/// Result alias for path operations.
pub type Result<T> = std::result::Result<T, PathError>;
