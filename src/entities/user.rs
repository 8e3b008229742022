//! User model for Ovoo.
//!
//! Users are the authorization subjects and the owners of addresses and
//! API tokens.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;
use crate::{OvooError, Result};

/// User role for permission management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular account owning protected addresses and aliases.
    #[default]
    Regular,
    /// Administrator.
    Admin,
    /// Service account used by the mail filter.
    Milter,
}

impl Role {
    /// All roles.
    pub const ALL: [Role; 3] = [Role::Regular, Role::Admin, Role::Milter];

    /// Convert role to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Regular => "regular",
            Role::Admin => "admin",
            Role::Milter => "milter",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = OvooError;

    /// Accepts the storage names as well as the numeric codes `0..=2`.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "regular" | "0" => Ok(Role::Regular),
            "admin" | "1" => Ok(Role::Admin),
            "milter" | "2" => Ok(Role::Milter),
            _ => Err(OvooError::Validation(format!("unsupported user type '{s}'"))),
        }
    }
}

/// User entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: Id,
    /// Role for permissions.
    pub role: Role,
    /// Login name (unique).
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    /// Password hash (Argon2). Empty for accounts without local login.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a user with a fresh id and no password.
    pub fn new(role: Role, login: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Id::new(),
            role,
            login: login.into(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set first and last name.
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    /// Check if this user is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Display name made of first and last name.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Check id and login.
    pub fn validate(&self) -> Result<()> {
        self.id.validate()?;
        if self.login.trim().is_empty() {
            return Err(OvooError::Validation("login can not be empty".to_string()));
        }
        Ok(())
    }
}
