//! API tokens.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::Id;
use crate::{OvooError, Result};

/// Number of random bytes in a token (hex-encoded to twice as many chars).
const TOKEN_BYTES: usize = 32;

/// Bearer token owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiToken {
    pub id: Id,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing, default)]
    pub token: String,
    pub owner: Id,
    pub expires_at: DateTime<Utc>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl ApiToken {
    /// Mint an active token valid for `expire_in_days`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        owner: Id,
        expire_in_days: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Id::new(),
            name: name.into(),
            description: description.into(),
            token: generate_token_string(),
            owner,
            expires_at: now + Duration::days(expire_in_days),
            active: true,
            created_at: now,
        }
    }

    /// Check the id, owner, name and token value.
    pub fn validate(&self) -> Result<()> {
        self.id
            .validate()
            .map_err(|e| OvooError::Validation(format!("validating token id: {e}")))?;
        self.owner
            .validate()
            .map_err(|e| OvooError::Validation(format!("validating token owner: {e}")))?;
        if self.name.trim().is_empty() {
            return Err(OvooError::Validation(
                "validating token: name can not be empty".to_string(),
            ));
        }
        if self.token.is_empty() {
            return Err(OvooError::Validation(
                "validating token: token value can not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the expiration time has passed.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Whether the token can currently authenticate.
    pub fn is_usable(&self) -> bool {
        self.active && !self.is_expired()
    }
}

/// Random hex string from the thread-local CSPRNG.
fn generate_token_string() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
