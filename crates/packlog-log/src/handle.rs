//! Stream names and handles.

use std::fmt;

/// Canonical identifier of a log stream inside the service's namespace.
///
/// Stream names are produced by the storage layer's namespace adapter
/// (`<namespace-root>/<normalized path>`) and are opaque to this crate.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamName(String);

impl StreamName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamName({})", self.0)
    }
}

/// Mode a stream handle was opened in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamMode {
    /// Opened by `open_or_create`; accepts appends until closed.
    Append,
    /// Opened by `open_existing`; serves chunks until exhausted.
    Read,
}

/// Opaque reference to an open log stream.
///
/// A handle is exclusively owned by the operation that opened it and must be
/// passed back to [`LogStreamClient::close`](crate::LogStreamClient::close)
/// on every exit path of that operation. Per-handle state (staged appends,
/// read cursor) lives inside the service, keyed by the handle id.
pub struct StreamHandle {
    id: u64,
    name: StreamName,
    mode: StreamMode,
}

impl StreamHandle {
    /// Construct a handle. Called by service backends only.
    pub fn new(id: u64, name: StreamName, mode: StreamMode) -> Self {
        Self { id, name, mode }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &StreamName {
        &self.name
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mode", &self.mode)
            .finish()
    }
}
