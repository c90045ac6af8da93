//! Packages storage engine for packlog.
//!
//! This crate is the heart of packlog. It maps path-addressable blob
//! semantics (write/read/list/delete/exists) onto the primitives of a
//! replicated append-only log service, consumed through the
//! [`LogStreamClient`](packlog_log::LogStreamClient) boundary.
//!
//! It provides:
//! - [`StreamNamespace`] — path ⇄ stream-name translation rules
//! - [`PackagesStorage`] — the asynchronous storage engine and its lifecycle
//! - [`StorageConfig`] / [`BackendKind`] — configuration over a closed set
//!   of backend variants
//! - [`create_storage`] — the backend factory

pub mod config;
pub mod engine;
pub mod error;
pub mod naming;
pub mod provider;

pub use config::{BackendKind, StorageConfig};
pub use engine::PackagesStorage;
pub use error::{StorageError, StorageResult};
pub use naming::StreamNamespace;
pub use provider::create_storage;
