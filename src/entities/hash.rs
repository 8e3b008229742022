//! Content hash used as chain key and reply-alias material.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};

use crate::{OvooError, Result};

/// Length of a hex-encoded SHA-512/256 digest.
pub const HASH_LENGTH: usize = 64;

/// Hex-encoded SHA-512/256 digest of an ordered string pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hash(String);

impl Hash {
    /// Hash `s1 + "+" + s2`.
    ///
    /// Order-sensitive: `Hash::new(a, b)` and `Hash::new(b, a)` differ in
    /// general.
    ///
    /// # Examples
    ///
    /// ```
    /// use ovoo::entities::Hash;
    ///
    /// let h = Hash::new("a", "b");
    /// assert_eq!(h.as_str().len(), 64);
    /// assert_eq!(h, Hash::new("a", "b"));
    /// ```
    pub fn new(s1: &str, s2: &str) -> Self {
        let mut hasher = Sha512_256::new();
        hasher.update(s1.as_bytes());
        hasher.update(b"+");
        hasher.update(s2.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Check length and alphabet.
    pub fn validate(&self) -> Result<()> {
        if self.0.len() != HASH_LENGTH {
            return Err(OvooError::Validation(
                "validating hash: wrong hash length".to_string(),
            ));
        }
        if !self.0.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(OvooError::Validation(
                "validating hash: wrong hash pattern".to_string(),
            ));
        }
        Ok(())
    }

    /// Borrow the textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Hash {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Hash {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
