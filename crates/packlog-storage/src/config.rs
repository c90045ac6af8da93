use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Closed set of storage backend variants.
///
/// Backends are selected here, at configuration time, and constructed by
/// [`create_storage`](crate::create_storage) -- there is no runtime
/// registration by class name. Adding a backend means adding a variant and
/// a factory arm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// In-memory log service, for tests and embedding.
    #[default]
    Memory,
}

/// Configuration for the packages storage engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Which log service backend to construct.
    pub backend: BackendKind,
    /// Prefix under which all package streams live in the log namespace.
    pub namespace_root: String,
    /// Chunk size used when streaming content into the log, in bytes.
    pub write_chunk_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            namespace_root: "packages".to_string(),
            write_chunk_size: 8 * 1024,
        }
    }
}

impl StorageConfig {
    /// Parse a configuration from TOML.
    pub fn from_toml(input: &str) -> StorageResult<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| StorageError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants not expressible in the type.
    pub fn validate(&self) -> StorageResult<()> {
        if self.write_chunk_size == 0 {
            return Err(StorageError::InvalidConfig(
                "write_chunk_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
