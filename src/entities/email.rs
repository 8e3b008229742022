//! Email address newtype.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::{OvooError, Result};

/// Maximum accepted length of an email address (RFC 5321 path limit).
pub const MAX_EMAIL_LENGTH: usize = 254;

/// A mailbox address such as `user@example.com`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Wrap a string without validating it.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Check that the address is syntactically valid.
    pub fn validate(&self) -> Result<()> {
        if self.0.len() > MAX_EMAIL_LENGTH {
            return Err(OvooError::Validation(format!(
                "validating email: longer than {MAX_EMAIL_LENGTH} characters"
            )));
        }
        if !self.0.validate_email() {
            return Err(OvooError::Validation(format!(
                "validating email: '{}' is not a valid address",
                self.0
            )));
        }
        Ok(())
    }

    /// Domain part (everything after the last `@`).
    pub fn domain(&self) -> Option<&str> {
        self.0.rsplit_once('@').map(|(_, domain)| domain)
    }

    /// Borrow the textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Email {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Email {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(Email::from("user@example.com").validate().is_ok());
        assert!(Email::from("user.name@example.co.jp").validate().is_ok());
        assert!(Email::from("user+tag@example.com").validate().is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        for bad in ["", "invalid", "@example.com", "user@", "user@@example.com", "user @example.com"] {
            assert!(Email::from(bad).validate().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_validate_email_too_long() {
        let long = format!("{}@example.com", "a".repeat(MAX_EMAIL_LENGTH));
        assert!(Email::new(long).validate().is_err());
    }

    #[test]
    fn test_domain() {
        assert_eq!(Email::from("a@x.org").domain(), Some("x.org"));
        assert_eq!(Email::from("nodomain").domain(), None);
    }
}
