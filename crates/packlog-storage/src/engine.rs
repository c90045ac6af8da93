//! The packages storage engine.
//!
//! [`PackagesStorage`] translates path-addressable blob operations onto the
//! log service behind a [`LogStreamClient`]. Each operation is async,
//! resolves exactly once, and acquires/releases its own stream handle --
//! no handle outlives a single operation, and no lock is shared between
//! operations on different paths.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use packlog_log::{LogStreamClient, StreamHandle};
use packlog_types::StoragePath;

use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::naming::StreamNamespace;

const STATE_CREATED: u8 = 0;
const STATE_INITIALIZED: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// Path-addressable blob storage over a replicated log service.
///
/// # Lifecycle
///
/// `Created → Initialized → Closed`. Every storage operation fails fast
/// with [`StorageError::NotInitialized`] before [`initialize`] completes
/// and after [`close`]. `initialize` is idempotent; a second `close` is a
/// no-op.
///
/// # Concurrency
///
/// Operations on different paths are fully independent. Concurrent writes
/// to the same path are not serialized here: the last writer to complete
/// determines the visible content. The engine performs no blocking waits
/// and adds no timeout policy of its own.
///
/// [`initialize`]: PackagesStorage::initialize
/// [`close`]: PackagesStorage::close
pub struct PackagesStorage {
    client: Arc<dyn LogStreamClient>,
    namespace: StreamNamespace,
    write_chunk_size: usize,
    state: AtomicU8,
}

impl PackagesStorage {
    /// Build an engine over an already-constructed log client. Most callers
    /// go through [`create_storage`](crate::create_storage) instead.
    pub fn new(client: Arc<dyn LogStreamClient>, config: &StorageConfig) -> StorageResult<Self> {
        config.validate()?;
        let namespace = StreamNamespace::new(&config.namespace_root)?;
        Ok(Self {
            client,
            namespace,
            write_chunk_size: config.write_chunk_size,
            state: AtomicU8::new(STATE_CREATED),
        })
    }

    /// Prepare the engine for use. Probes the namespace root so that
    /// connectivity problems surface here rather than on the first
    /// operation. Idempotent; fails with [`StorageError::NotInitialized`]
    /// once the engine has been closed.
    pub async fn initialize(&self) -> StorageResult<()> {
        if self.state.load(Ordering::SeqCst) == STATE_CLOSED {
            return Err(StorageError::NotInitialized);
        }
        self.client.list_children(self.namespace.root()).await?;
        match self.state.compare_exchange(
            STATE_CREATED,
            STATE_INITIALIZED,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => {
                info!(root = self.namespace.root(), "packages storage initialized");
                Ok(())
            }
            Err(STATE_INITIALIZED) => Ok(()),
            Err(_) => Err(StorageError::NotInitialized),
        }
    }

    /// Release engine-level resources. A second call is a no-op; storage
    /// operations after `close` fail with [`StorageError::NotInitialized`].
    pub async fn close(&self) -> StorageResult<()> {
        let prev = self.state.swap(STATE_CLOSED, Ordering::SeqCst);
        if prev == STATE_CLOSED {
            return Ok(());
        }
        self.client.shutdown().await?;
        info!("packages storage closed");
        Ok(())
    }

    /// Write the full `content` as the package at `path`.
    ///
    /// Creates the stream if absent. If a package already exists at `path`,
    /// the prior content becomes unreachable once this write completes; a
    /// failed write leaves the prior content untouched.
    pub async fn write<R>(&self, path: &str, content: R) -> StorageResult<()>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.ensure_initialized()?;
        let path = StoragePath::parse(path)?;
        let name = self.namespace.stream_name(&path);

        let mut handle = self.client.open_or_create(&name).await?;
        match self.stage_content(&mut handle, content).await {
            Ok(bytes) => {
                self.client.close(handle).await?;
                debug!(%path, bytes, "package written");
                Ok(())
            }
            Err(err) => {
                if let Err(abort_err) = self.client.abort(handle).await {
                    warn!(%path, error = %abort_err, "failed to release handle after write error");
                }
                Err(err)
            }
        }
    }

    /// Stream the package at `path`, in write order, into `sink`.
    ///
    /// Fails with [`StorageError::NotFound`] when no live stream backs
    /// `path`.
    pub async fn read<W>(&self, path: &str, sink: &mut W) -> StorageResult<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        self.ensure_initialized()?;
        let path = StoragePath::parse(path)?;
        let name = self.namespace.stream_name(&path);

        let mut handle = self.client.open_existing(&name).await?;
        match self.drain_stream(&mut handle, sink).await {
            Ok(bytes) => {
                self.client.close(handle).await?;
                debug!(%path, bytes, "package read");
                Ok(())
            }
            Err(err) => {
                // Release via abort: identical to close for a read handle,
                // and it does not depend on the service being reachable.
                if let Err(abort_err) = self.client.abort(handle).await {
                    warn!(%path, error = %abort_err, "failed to release handle after read error");
                }
                Err(err)
            }
        }
    }

    /// Names of the packages directly under `root`, relative to it.
    ///
    /// A non-existent root yields an empty set, never an error. The empty
    /// root string enumerates the depth-1 entries of the whole namespace.
    pub async fn list(&self, root: &str) -> StorageResult<BTreeSet<String>> {
        self.ensure_initialized()?;
        let prefix = self.namespace.listing_prefix(root)?;
        let children = self.client.list_children(&prefix).await?;
        debug!(root, count = children.len(), "listed packages");
        Ok(children)
    }

    /// Delete the package at `path` and its namespace entry.
    ///
    /// Fails with [`StorageError::NotFound`] when nothing backs `path`; a
    /// second delete of the same path therefore fails.
    pub async fn delete(&self, path: &str) -> StorageResult<()> {
        self.ensure_initialized()?;
        let path = StoragePath::parse(path)?;
        let name = self.namespace.stream_name(&path);
        self.client.delete(&name).await?;
        debug!(%path, "package deleted");
        Ok(())
    }

    /// Whether a live stream backs `path`. Absence resolves to `false`;
    /// only transport/service failures fail the future.
    pub async fn exists(&self, path: &str) -> StorageResult<bool> {
        self.ensure_initialized()?;
        let path = StoragePath::parse(path)?;
        let name = self.namespace.stream_name(&path);
        Ok(self.client.exists(&name).await?)
    }

    fn ensure_initialized(&self) -> StorageResult<()> {
        if self.state.load(Ordering::SeqCst) == STATE_INITIALIZED {
            Ok(())
        } else {
            Err(StorageError::NotInitialized)
        }
    }

    async fn stage_content<R>(&self, handle: &mut StreamHandle, mut content: R) -> StorageResult<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut buf = vec![0u8; self.write_chunk_size];
        let mut total = 0u64;
        loop {
            let n = content.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            self.client.append(handle, &buf[..n]).await?;
            total += n as u64;
        }
        Ok(total)
    }

    async fn drain_stream<W>(&self, handle: &mut StreamHandle, sink: &mut W) -> StorageResult<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut total = 0u64;
        while let Some(chunk) = self.client.next_chunk(handle).await? {
            sink.write_all(&chunk).await?;
            total += chunk.len() as u64;
        }
        sink.flush().await?;
        Ok(total)
    }
}

impl std::fmt::Debug for PackagesStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state.load(Ordering::SeqCst) {
            STATE_CREATED => "created",
            STATE_INITIALIZED => "initialized",
            _ => "closed",
        };
        f.debug_struct("PackagesStorage")
            .field("namespace_root", &self.namespace.root())
            .field("state", &state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use packlog_log::MemoryLogService;

    /// Content source that fails after yielding one chunk.
    struct FailingReader {
        yielded: bool,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut tokio::io::ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.yielded {
                Poll::Ready(Err(io::Error::other("content source failed")))
            } else {
                self.yielded = true;
                buf.put_slice(b"partial-");
                Poll::Ready(Ok(()))
            }
        }
    }

    /// Content source that takes the service down after its first chunk,
    /// so the outage strikes while the write handle is open.
    struct OutageReader {
        service: Arc<MemoryLogService>,
        yielded: bool,
    }

    impl AsyncRead for OutageReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut tokio::io::ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.yielded {
                self.service.set_available(false);
            } else {
                self.yielded = true;
            }
            buf.put_slice(b"chunk");
            Poll::Ready(Ok(()))
        }
    }

    /// Output sink that takes the service down on the first chunk it
    /// receives, so the outage strikes while the read handle is open.
    struct OutageSink {
        service: Arc<MemoryLogService>,
    }

    impl AsyncWrite for OutageSink {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.service.set_available(false);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Output sink that rejects every write.
    struct FailingWriter;

    impl AsyncWrite for FailingWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::other("sink failed")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn make_engine() -> (Arc<MemoryLogService>, PackagesStorage) {
        let service = Arc::new(MemoryLogService::new());
        let engine =
            PackagesStorage::new(service.clone(), &StorageConfig::default()).unwrap();
        (service, engine)
    }

    async fn make_initialized() -> (Arc<MemoryLogService>, PackagesStorage) {
        let (service, engine) = make_engine();
        engine.initialize().await.unwrap();
        (service, engine)
    }

    async fn read_to_vec(engine: &PackagesStorage, path: &str) -> StorageResult<Vec<u8>> {
        let mut out = Vec::new();
        engine.read(path, &mut out).await?;
        Ok(out)
    }

    #[tokio::test]
    async fn operations_fail_fast_before_initialize() {
        let (_service, engine) = make_engine();
        assert!(matches!(
            engine.write("p", &b"x"[..]).await,
            Err(StorageError::NotInitialized)
        ));
        assert!(matches!(
            read_to_vec(&engine, "p").await,
            Err(StorageError::NotInitialized)
        ));
        assert!(matches!(engine.list("").await, Err(StorageError::NotInitialized)));
        assert!(matches!(
            engine.delete("p").await,
            Err(StorageError::NotInitialized)
        ));
        assert!(matches!(
            engine.exists("p").await,
            Err(StorageError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let (_service, engine) = make_engine();
        engine.initialize().await.unwrap();
        engine.initialize().await.unwrap();
        engine.write("p", &b"x"[..]).await.unwrap();
    }

    #[tokio::test]
    async fn initialize_surfaces_outage() {
        let (service, engine) = make_engine();
        service.set_available(false);
        assert!(matches!(
            engine.initialize().await,
            Err(StorageError::BackendUnavailable(_))
        ));
        // Recovery: the failed attempt did not consume the lifecycle.
        service.set_available(true);
        engine.initialize().await.unwrap();
    }

    #[tokio::test]
    async fn close_is_terminal_and_repeatable() {
        let (_service, engine) = make_initialized().await;
        engine.close().await.unwrap();
        engine.close().await.unwrap();
        assert!(matches!(
            engine.exists("p").await,
            Err(StorageError::NotInitialized)
        ));
        assert!(matches!(
            engine.initialize().await,
            Err(StorageError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn write_then_read_round_trip() {
        let (service, engine) = make_initialized().await;
        engine.write("root/sub/name", &b"blob-content"[..]).await.unwrap();
        assert_eq!(
            read_to_vec(&engine, "root/sub/name").await.unwrap(),
            b"blob-content"
        );
        assert_eq!(service.open_handle_count(), 0);
    }

    #[tokio::test]
    async fn path_spelling_does_not_matter() {
        let (_service, engine) = make_initialized().await;
        engine.write("/a/b/", &b"v"[..]).await.unwrap();
        assert_eq!(read_to_vec(&engine, "a//b").await.unwrap(), b"v");
    }

    #[tokio::test]
    async fn invalid_path_is_rejected_everywhere() {
        let (_service, engine) = make_initialized().await;
        assert!(matches!(
            engine.write("", &b"x"[..]).await,
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            read_to_vec(&engine, "a:b").await,
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            engine.delete("a/../b").await,
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            engine.exists("has space").await,
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            engine.list("bad*root").await,
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn read_missing_package() {
        let (service, engine) = make_initialized().await;
        assert!(matches!(
            read_to_vec(&engine, "never-written").await,
            Err(StorageError::NotFound(_))
        ));
        assert_eq!(service.open_handle_count(), 0);
    }

    #[tokio::test]
    async fn failed_write_preserves_prior_content() {
        let (service, engine) = make_initialized().await;
        engine.write("pkg", &b"version-1"[..]).await.unwrap();

        let err = engine
            .write("pkg", FailingReader { yielded: false })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));

        assert_eq!(read_to_vec(&engine, "pkg").await.unwrap(), b"version-1");
        assert_eq!(service.open_handle_count(), 0);
    }

    #[tokio::test]
    async fn failed_read_releases_handle() {
        let (service, engine) = make_initialized().await;
        engine.write("pkg", &b"content"[..]).await.unwrap();

        let mut sink = FailingWriter;
        let err = engine.read("pkg", &mut sink).await.unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert_eq!(service.open_handle_count(), 0);
    }

    #[tokio::test]
    async fn orphan_namespace_entry_reads_as_absent() {
        let (service, engine) = make_initialized().await;
        let ns = StreamNamespace::new("packages").unwrap();
        let name = ns.stream_name(&StoragePath::parse("ghost").unwrap());
        service.inject_namespace_entry(&name);

        assert!(!engine.exists("ghost").await.unwrap());
        assert!(matches!(
            read_to_vec(&engine, "ghost").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            engine.delete("ghost").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn outage_mid_read_releases_handle() {
        let (service, engine) = make_initialized().await;
        engine.write("pkg", &b"survives the outage"[..]).await.unwrap();

        let mut sink = OutageSink {
            service: service.clone(),
        };
        let err = engine.read("pkg", &mut sink).await.unwrap_err();
        assert!(matches!(err, StorageError::BackendUnavailable(_)));
        assert_eq!(service.open_handle_count(), 0);

        // Content is intact once the service recovers.
        service.set_available(true);
        assert_eq!(
            read_to_vec(&engine, "pkg").await.unwrap(),
            b"survives the outage"
        );
    }

    #[tokio::test]
    async fn outage_mid_write_releases_handle() {
        let (service, engine) = make_initialized().await;
        engine.write("pkg", &b"version-1"[..]).await.unwrap();

        let reader = OutageReader {
            service: service.clone(),
            yielded: false,
        };
        let err = engine.write("pkg", reader).await.unwrap_err();
        assert!(matches!(err, StorageError::BackendUnavailable(_)));
        assert_eq!(service.open_handle_count(), 0);

        service.set_available(true);
        assert_eq!(read_to_vec(&engine, "pkg").await.unwrap(), b"version-1");
    }

    #[tokio::test]
    async fn outage_maps_to_backend_unavailable() {
        let (service, engine) = make_initialized().await;
        service.set_available(false);
        assert!(matches!(
            engine.write("p", &b"x"[..]).await,
            Err(StorageError::BackendUnavailable(_))
        ));
        assert!(matches!(
            engine.exists("p").await,
            Err(StorageError::BackendUnavailable(_))
        ));
        assert!(matches!(
            engine.list("").await,
            Err(StorageError::BackendUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn list_returns_relative_names() {
        let (_service, engine) = make_initialized().await;
        engine.write("team/tool-a", &b"1"[..]).await.unwrap();
        engine.write("team/tool-b", &b"2"[..]).await.unwrap();
        engine.write("other/tool-c", &b"3"[..]).await.unwrap();

        let names = engine.list("team").await.unwrap();
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["tool-a", "tool-b"]);
    }

    #[tokio::test]
    async fn empty_write_creates_live_empty_package() {
        let (_service, engine) = make_initialized().await;
        engine.write("empty", &b""[..]).await.unwrap();
        assert!(engine.exists("empty").await.unwrap());
        assert_eq!(read_to_vec(&engine, "empty").await.unwrap(), b"");
    }

    #[tokio::test]
    async fn chunked_content_survives_intact() {
        let (_service, engine) = make_initialized().await;
        // Larger than the default chunk size, so multiple appends happen.
        let blob: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        engine.write("big", blob.as_slice()).await.unwrap();
        assert_eq!(read_to_vec(&engine, "big").await.unwrap(), blob);
    }
}
