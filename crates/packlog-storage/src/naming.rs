//! Path ⇄ stream-name translation.
//!
//! The stream namespace is flat and prefix-scoped; package paths are
//! hierarchical. A [`StreamNamespace`] pins the translation down to one
//! rule: `<namespace-root>/<normalized path>`. That mapping is pure,
//! deterministic, and collision-free over valid paths (normalization is
//! canonical, so two distinct paths never share a stream name), and the
//! produced name doubles as the prefix key for listing.

use packlog_log::StreamName;
use packlog_types::StoragePath;

use crate::error::{StorageError, StorageResult};

/// Translation rules between package paths and log stream names.
#[derive(Clone, Debug)]
pub struct StreamNamespace {
    root: String,
}

impl StreamNamespace {
    /// Create a namespace rooted at `root`. The root itself must be a valid
    /// path (it shares the stream namespace with the names it prefixes).
    pub fn new(root: &str) -> StorageResult<Self> {
        let root = StoragePath::parse(root)
            .map_err(|e| StorageError::InvalidConfig(format!("namespace root: {e}")))?;
        Ok(Self {
            root: root.as_str().to_string(),
        })
    }

    /// The namespace root prefix.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Canonical stream name for a package path.
    pub fn stream_name(&self, path: &StoragePath) -> StreamName {
        StreamName::new(format!("{}/{}", self.root, path))
    }

    /// Listing prefix for a root path. The empty root lists the namespace
    /// root itself (depth-1 entries of the whole namespace).
    pub fn listing_prefix(&self, root_path: &str) -> StorageResult<String> {
        if root_path.trim_matches('/').is_empty() {
            return Ok(self.root.clone());
        }
        let path = StoragePath::parse(root_path)?;
        Ok(format!("{}/{}", self.root, path))
    }

    /// Package path for a stream name inside this namespace, or `None` for
    /// names outside it (including the bare root).
    pub fn relative_path(&self, name: &StreamName) -> Option<StoragePath> {
        let rest = name.as_str().strip_prefix(&self.root)?.strip_prefix('/')?;
        StoragePath::parse(rest).ok()
    }
}
