//! Log stream client boundary for packlog.
//!
//! This crate defines the capability set the storage engine consumes from the
//! external replicated log service, and nothing more. The engine never talks
//! to the log or coordination service directly -- everything goes through the
//! [`LogStreamClient`] trait.
//!
//! # Capability Set
//!
//! - `open_or_create` / `open_existing` -- acquire a [`StreamHandle`]
//! - `append` / `next_chunk` -- write and read stream content in chunks
//! - `delete` / `exists` / `list_children` -- namespace bookkeeping
//! - `close` -- release a handle (idempotent)
//!
//! # Backends
//!
//! - [`MemoryLogService`] -- `HashMap`-based service for tests and embedding
//!
//! # Design Rules
//!
//! 1. Handles are exclusively owned by the operation that opened them.
//! 2. A read cursor is not restartable; reopen the stream to read again.
//! 3. Appends are staged per-handle; closing the append handle promotes the
//!    staged content to the stream's canonical version.
//! 4. All service errors are propagated, never silently ignored.

pub mod error;
pub mod handle;
pub mod memory;
pub mod traits;

pub use error::{LogError, LogResult};
pub use handle::{StreamHandle, StreamMode, StreamName};
pub use memory::MemoryLogService;
pub use traits::LogStreamClient;
