//! Hierarchical package paths.
//!
//! A [`StoragePath`] identifies a package blob. Paths are `/`-delimited,
//! normalized on construction (leading, trailing, and repeated slashes are
//! removed), and validated against the characters the stream namespace
//! reserves for itself.
//!
//! Valid paths:
//! - Must have at least one non-empty segment after normalization
//! - Must not contain whitespace, control characters, or any of
//!   `:`, `*`, `?`, `<`, `>`, `|`, `"`, `\`
//! - Segments must not be `.` or `..` and must not start with `.`

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PathError, Result};

/// Characters that are forbidden anywhere in a path. The stream namespace
/// uses some of these internally (`:` separates namespace URIs), the rest
/// are rejected to keep stream names portable.
const FORBIDDEN_CHARS: &[char] = &[':', '*', '?', '<', '>', '|', '"', '\\'];

/// A normalized, validated package path.
///
/// Two paths are equal iff their normalized segment sequences are equal;
/// `a/b`, `/a/b/`, and `a//b` all parse to the same path.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoragePath {
    normalized: String,
}

impl StoragePath {
    /// Parse and normalize a raw path string.
    ///
    /// # Examples
    ///
    /// ```
    /// use packlog_types::StoragePath;
    ///
    /// let p = StoragePath::parse("/root/sub/name/").unwrap();
    /// assert_eq!(p.as_str(), "root/sub/name");
    /// assert!(StoragePath::parse("").is_err());
    /// assert!(StoragePath::parse("a/../b").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        for ch in raw.chars() {
            if ch.is_whitespace() || ch.is_control() || FORBIDDEN_CHARS.contains(&ch) {
                return Err(PathError::ForbiddenCharacter {
                    path: raw.to_string(),
                    ch,
                });
            }
        }

        let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        for segment in &segments {
            if segment.starts_with('.') {
                return Err(PathError::ReservedSegment {
                    path: raw.to_string(),
                    segment: segment.to_string(),
                });
            }
        }

        Ok(Self {
            normalized: segments.join("/"),
        })
    }

    /// The normalized path string (no leading/trailing slashes).
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Iterate over the path's segments, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.normalized.split('/')
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Last segment (the package's own name).
    pub fn name(&self) -> &str {
        self.normalized.rsplit('/').next().unwrap_or(&self.normalized)
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl fmt::Debug for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoragePath({})", self.normalized)
    }
}

impl TryFrom<String> for StoragePath {
    type Error = PathError;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(&raw)
    }
}

impl std::str::FromStr for StoragePath {
    type Err = PathError;

    fn from_str(raw: &str) -> Result<Self> {
        Self::parse(raw)
    }
}

impl From<StoragePath> for String {
    fn from(path: StoragePath) -> String {
        path.normalized
    }
}
