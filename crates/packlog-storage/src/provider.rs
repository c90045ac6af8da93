//! Backend factory.
//!
//! Backends form a closed set ([`BackendKind`]); selecting one is a `match`
//! here, not runtime registration by class name. A caller holding its own
//! [`LogStreamClient`] implementation (a real log service connection) can
//! bypass the factory and use [`PackagesStorage::new`] directly.

use std::sync::Arc;

use tracing::debug;

use packlog_log::MemoryLogService;

use crate::config::{BackendKind, StorageConfig};
use crate::engine::PackagesStorage;
use crate::error::StorageResult;

/// Construct a storage engine for the configured backend.
///
/// The returned engine still needs
/// [`initialize`](PackagesStorage::initialize) before use.
pub fn create_storage(config: &StorageConfig) -> StorageResult<PackagesStorage> {
    debug!(backend = ?config.backend, root = %config.namespace_root, "creating packages storage");
    match config.backend {
        BackendKind::Memory => {
            let client = Arc::new(MemoryLogService::new());
            PackagesStorage::new(client, config)
        }
    }
}
