//! Sortable identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{OvooError, Result};

/// Opaque, lexicographically sortable identifier (UUIDv7 in its hyphenated
/// text form).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// Generate a new time-ordered identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Check that the identifier is non-empty and well formed.
    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(OvooError::Validation(
                "validating id: can not be empty".to_string(),
            ));
        }
        Uuid::parse_str(&self.0)
            .map_err(|e| OvooError::Validation(format!("validating id: {e}")))?;
        Ok(())
    }

    /// Borrow the textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
