use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::{LogError, LogResult};
use crate::handle::{StreamHandle, StreamMode, StreamName};
use crate::traits::LogStreamClient;

/// Namespace record for one stream.
///
/// `canonical` is `None` while a namespace entry exists but no writer has
/// promoted content yet -- the "node present, stream absent" intermediate
/// state.
#[derive(Default)]
struct StreamRecord {
    canonical: Option<Vec<Bytes>>,
}

/// Service-side state of one open handle.
struct OpenState {
    name: StreamName,
    mode: StreamMode,
    /// Chunks staged by an append handle, promoted on close.
    staged: Vec<Bytes>,
    /// Snapshot served to a read handle, taken at open.
    chunks: Vec<Bytes>,
    cursor: usize,
}

/// In-memory, HashMap-based log stream service.
///
/// Intended for tests and embedding. Streams and open-handle state are held
/// behind `RwLock`s; chunk payloads are `Bytes`, so read snapshots are cheap
/// clones. The `set_available` switch simulates a service outage for testing
/// error classification.
pub struct MemoryLogService {
    streams: RwLock<HashMap<String, StreamRecord>>,
    open: RwLock<HashMap<u64, OpenState>>,
    next_handle: AtomicU64,
    available: AtomicBool,
}

impl MemoryLogService {
    /// Create a new empty service.
    pub fn new() -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            open: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
            available: AtomicBool::new(true),
        }
    }

    /// Number of namespace entries (live or not).
    pub fn stream_count(&self) -> usize {
        self.streams.read().expect("lock poisoned").len()
    }

    /// Number of handles currently open. Zero after every well-behaved
    /// engine operation.
    pub fn open_handle_count(&self) -> usize {
        self.open.read().expect("lock poisoned").len()
    }

    /// Simulate the service going down (`false`) or recovering (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Create a namespace entry with no backing stream, the inconsistent
    /// state left behind by an interrupted first write.
    pub fn inject_namespace_entry(&self, name: &StreamName) {
        self.streams
            .write()
            .expect("lock poisoned")
            .entry(name.as_str().to_string())
            .or_default();
    }

    /// Remove all streams and open handles.
    pub fn clear(&self) {
        self.streams.write().expect("lock poisoned").clear();
        self.open.write().expect("lock poisoned").clear();
    }

    fn check_available(&self) -> LogResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LogError::Unavailable("memory service marked down".into()))
        }
    }

    fn register(&self, name: &StreamName, mode: StreamMode) -> StreamHandle {
        let id = self.next_handle.fetch_add(1, Ordering::SeqCst);
        let chunks = match mode {
            StreamMode::Read => {
                let streams = self.streams.read().expect("lock poisoned");
                streams
                    .get(name.as_str())
                    .and_then(|r| r.canonical.clone())
                    .unwrap_or_default()
            }
            StreamMode::Append => Vec::new(),
        };
        self.open.write().expect("lock poisoned").insert(
            id,
            OpenState {
                name: name.clone(),
                mode,
                staged: Vec::new(),
                chunks,
                cursor: 0,
            },
        );
        StreamHandle::new(id, name.clone(), mode)
    }
}

impl Default for MemoryLogService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogStreamClient for MemoryLogService {
    async fn open_or_create(&self, name: &StreamName) -> LogResult<StreamHandle> {
        self.check_available()?;
        self.streams
            .write()
            .expect("lock poisoned")
            .entry(name.as_str().to_string())
            .or_default();
        let handle = self.register(name, StreamMode::Append);
        debug!(stream = %name, handle = handle.id(), "opened stream for append");
        Ok(handle)
    }

    async fn open_existing(&self, name: &StreamName) -> LogResult<StreamHandle> {
        self.check_available()?;
        {
            let streams = self.streams.read().expect("lock poisoned");
            let live = streams
                .get(name.as_str())
                .is_some_and(|r| r.canonical.is_some());
            if !live {
                return Err(LogError::NotFound(name.clone()));
            }
        }
        let handle = self.register(name, StreamMode::Read);
        debug!(stream = %name, handle = handle.id(), "opened stream for read");
        Ok(handle)
    }

    async fn append(&self, handle: &mut StreamHandle, chunk: &[u8]) -> LogResult<()> {
        self.check_available()?;
        let mut open = self.open.write().expect("lock poisoned");
        let state = open.get_mut(&handle.id()).ok_or(LogError::BadHandle {
            handle: handle.id(),
            reason: "not open".into(),
        })?;
        if state.mode != StreamMode::Append {
            return Err(LogError::BadHandle {
                handle: handle.id(),
                reason: "append on read handle".into(),
            });
        }
        state.staged.push(Bytes::copy_from_slice(chunk));
        Ok(())
    }

    async fn next_chunk(&self, handle: &mut StreamHandle) -> LogResult<Option<Bytes>> {
        self.check_available()?;
        let mut open = self.open.write().expect("lock poisoned");
        let state = open.get_mut(&handle.id()).ok_or(LogError::BadHandle {
            handle: handle.id(),
            reason: "not open".into(),
        })?;
        if state.mode != StreamMode::Read {
            return Err(LogError::BadHandle {
                handle: handle.id(),
                reason: "read on append handle".into(),
            });
        }
        if state.cursor >= state.chunks.len() {
            return Ok(None);
        }
        let chunk = state.chunks[state.cursor].clone();
        state.cursor += 1;
        Ok(Some(chunk))
    }

    async fn delete(&self, name: &StreamName) -> LogResult<()> {
        self.check_available()?;
        let mut streams = self.streams.write().expect("lock poisoned");
        let live = streams
            .get(name.as_str())
            .is_some_and(|r| r.canonical.is_some());
        if !live {
            return Err(LogError::NotFound(name.clone()));
        }
        streams.remove(name.as_str());
        debug!(stream = %name, "deleted stream");
        Ok(())
    }

    async fn exists(&self, name: &StreamName) -> LogResult<bool> {
        self.check_available()?;
        let streams = self.streams.read().expect("lock poisoned");
        Ok(streams
            .get(name.as_str())
            .is_some_and(|r| r.canonical.is_some()))
    }

    async fn list_children(&self, prefix: &str) -> LogResult<BTreeSet<String>> {
        self.check_available()?;
        let streams = self.streams.read().expect("lock poisoned");
        let mut children = BTreeSet::new();
        for name in streams.keys() {
            let relative = if prefix.is_empty() {
                name.as_str()
            } else if let Some(rest) = name.strip_prefix(prefix).and_then(|r| r.strip_prefix('/')) {
                rest
            } else {
                // Either outside the prefix, or the prefix's own stream.
                continue;
            };
            if let Some(first) = relative.split('/').next() {
                if !first.is_empty() {
                    children.insert(first.to_string());
                }
            }
        }
        Ok(children)
    }

    async fn close(&self, handle: StreamHandle) -> LogResult<()> {
        // Releasing handle state is local, never gated on availability.
        let state = self.open.write().expect("lock poisoned").remove(&handle.id());
        // Unknown id: already closed, keep close idempotent.
        let Some(state) = state else { return Ok(()) };
        if handle.mode() == StreamMode::Append {
            let mut streams = self.streams.write().expect("lock poisoned");
            let record = streams.entry(state.name.as_str().to_string()).or_default();
            record.canonical = Some(state.staged);
            debug!(stream = %handle.name(), handle = handle.id(), "promoted staged content");
        }
        Ok(())
    }

    async fn abort(&self, handle: StreamHandle) -> LogResult<()> {
        let state = self.open.write().expect("lock poisoned").remove(&handle.id());
        if state.is_some() {
            debug!(stream = %handle.name(), handle = handle.id(), "aborted handle, staged content dropped");
        }
        Ok(())
    }

    async fn shutdown(&self) -> LogResult<()> {
        let dropped = {
            let mut open = self.open.write().expect("lock poisoned");
            let n = open.len();
            open.clear();
            n
        };
        debug!(dropped_handles = dropped, "memory log service shut down");
        Ok(())
    }
}

impl std::fmt::Debug for MemoryLogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLogService")
            .field("stream_count", &self.stream_count())
            .field("open_handles", &self.open_handle_count())
            .finish()
    }
}
