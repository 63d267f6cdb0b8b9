use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Maximum length of an object key in bytes.
pub const MAX_KEY_LENGTH: usize = 512;

/// A validated, relative object key such as `recipes/7-1718000000000-pasta.jpg`.
///
/// Keys are slash-separated, never absolute, never contain `..` or hidden
/// segments, and only use `a-zA-Z0-9`, `/`, `-`, `_` and `.`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Parse and validate a key. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let trimmed = raw.trim();
        let invalid = |msg: &str| Err(StorageError::InvalidKey(msg.to_string()));

        if trimmed.is_empty() {
            return invalid("key cannot be empty");
        }
        if trimmed.len() > MAX_KEY_LENGTH {
            return invalid("key exceeds maximum length of 512 bytes");
        }
        if trimmed.starts_with('/') || trimmed.ends_with('/') {
            return invalid("key must not start or end with '/'");
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))
        {
            return invalid("key contains invalid characters (allowed: a-zA-Z0-9, /, -, _, .)");
        }
        for segment in trimmed.split('/') {
            if segment.is_empty() {
                return invalid("key must not contain empty segments");
            }
            // Also rejects "." and "..".
            if segment.starts_with('.') {
                return invalid("key segments must not start with '.'");
            }
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final segment of the key.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Relative filesystem path for this key.
    pub fn to_relative_path(&self) -> PathBuf {
        self.0.split('/').collect()
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({})", self.0)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ObjectKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ObjectKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
