//! Chain: one directional mail-relay rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Address, AddressKind, Hash};
use crate::{OvooError, Result};

/// A relay rule keyed by the hash of the original sender/recipient pair.
///
/// `from_address`/`to_address` is the rewritten envelope pair,
/// `orig_from_address`/`orig_to_address` the pair observed by the mail filter
/// before rewriting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub hash: Hash,
    pub from_address: Address,
    pub to_address: Address,
    pub orig_from_address: Address,
    pub orig_to_address: Address,
    pub created_at: DateTime<Utc>,
}

impl Chain {
    /// Build a chain whose hash is derived from the original pair.
    pub fn new(
        from_address: Address,
        to_address: Address,
        orig_from_address: Address,
        orig_to_address: Address,
    ) -> Self {
        let hash = Hash::new(
            orig_from_address.email.as_str(),
            orig_to_address.email.as_str(),
        );
        Self {
            hash,
            from_address,
            to_address,
            orig_from_address,
            orig_to_address,
            created_at: Utc::now(),
        }
    }

    /// Check the hash format and the rewritten address pair.
    ///
    /// The hash is intentionally not recomputed from `from`/`to`: it is keyed
    /// on the original pair.
    pub fn validate(&self) -> Result<()> {
        self.hash.validate()?;
        self.from_address
            .validate()
            .map_err(|e| OvooError::Validation(format!("validating chain from address: {e}")))?;
        self.to_address
            .validate()
            .map_err(|e| OvooError::Validation(format!("validating chain to address: {e}")))?;
        Ok(())
    }

    /// Whether this chain carries a reply from a protected address back to an
    /// external correspondent.
    pub fn is_reply(&self) -> bool {
        self.orig_to_address.kind == AddressKind::ReplyAlias
    }

    /// Compact view of the chain as consumed by mail-filter clients.
    pub fn summary(&self) -> ChainSummary {
        ChainSummary {
            hash: self.hash.clone(),
            from_email: self.from_address.email.to_string(),
            to_email: self.to_address.email.to_string(),
            orig_from_address: ChainAddressSummary::from(&self.orig_from_address),
            orig_to_address: ChainAddressSummary::from(&self.orig_to_address),
        }
    }
}

/// Email and kind of one chain endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainAddressSummary {
    pub email: String,
    #[serde(rename = "type")]
    pub kind: AddressKind,
}

impl From<&Address> for ChainAddressSummary {
    fn from(addr: &Address) -> Self {
        Self {
            email: addr.email.to_string(),
            kind: addr.kind,
        }
    }
}

/// `{hash, from_email, to_email, orig_from_address, orig_to_address}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSummary {
    pub hash: Hash,
    pub from_email: String,
    pub to_email: String,
    pub orig_from_address: ChainAddressSummary,
    pub orig_to_address: ChainAddressSummary,
}
