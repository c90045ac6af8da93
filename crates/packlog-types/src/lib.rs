//! Foundation types for packlog.
//!
//! This crate provides the path type used throughout the packlog system.
//! Every other packlog crate depends on `packlog-types`.
//!
//! # Key Types
//!
//! - [`StoragePath`] — Normalized, validated hierarchical package path
//! - [`PathError`] — Path validation failures

pub mod error;
pub mod path;

pub use error::PathError;
pub use path::StoragePath;
