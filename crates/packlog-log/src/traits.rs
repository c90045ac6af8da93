use std::collections::BTreeSet;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::LogResult;
use crate::handle::{StreamHandle, StreamName};

/// Client interface to the external replicated log service.
///
/// All implementations must satisfy these invariants:
/// - Every handle returned by an open call is released by exactly one
///   `close` call; `close` on an unknown handle is a no-op.
/// - Appends are visible to readers only after the append handle closes;
///   closing promotes the staged content to the stream's canonical version,
///   making any prior version unreachable.
/// - Read cursors advance monotonically and are not restartable.
/// - Namespace enumeration and handle state are internally synchronized;
///   callers may share the client across tasks.
#[async_trait]
pub trait LogStreamClient: Send + Sync {
    /// Open a stream for appending, creating it (and its namespace entry)
    /// if absent. Fails with [`LogError::Unavailable`](crate::LogError) on
    /// transport/service failure.
    async fn open_or_create(&self, name: &StreamName) -> LogResult<StreamHandle>;

    /// Open an existing stream for reading.
    ///
    /// Fails with [`LogError::NotFound`](crate::LogError) when no live
    /// stream backs `name` -- including the case where a namespace entry
    /// exists but no content was ever promoted.
    async fn open_existing(&self, name: &StreamName) -> LogResult<StreamHandle>;

    /// Stage a chunk on an append-mode handle.
    async fn append(&self, handle: &mut StreamHandle, chunk: &[u8]) -> LogResult<()>;

    /// Next chunk from a read-mode handle, in append order.
    ///
    /// Returns `Ok(None)` once the stream is exhausted. The sequence is
    /// finite and not restartable without reopening.
    async fn next_chunk(&self, handle: &mut StreamHandle) -> LogResult<Option<Bytes>>;

    /// Delete a stream and its namespace entry. Fails with
    /// [`LogError::NotFound`](crate::LogError) when no live stream backs
    /// `name`.
    async fn delete(&self, name: &StreamName) -> LogResult<()>;

    /// Whether a live stream backs `name`. Absence is `Ok(false)`, never an
    /// error.
    async fn exists(&self, name: &StreamName) -> LogResult<bool>;

    /// Depth-1 child names under `prefix`, relative to it. An absent prefix
    /// yields an empty set.
    async fn list_children(&self, prefix: &str) -> LogResult<BTreeSet<String>>;

    /// Release a handle. Idempotent; closing an append handle promotes its
    /// staged content.
    async fn close(&self, handle: StreamHandle) -> LogResult<()>;

    /// Release a handle without promoting staged content. Equivalent to
    /// `close` for read handles. Used on the failure path of a write so a
    /// partial upload never becomes the canonical version.
    async fn abort(&self, handle: StreamHandle) -> LogResult<()>;

    /// Tear down the connection to the log/coordination service. Backends
    /// without a connection keep the default no-op.
    async fn shutdown(&self) -> LogResult<()> {
        Ok(())
    }
}
