//! Address model: the four address kinds and their forward-pointer rules.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Email, Id};
use crate::{OvooError, Result};

/// Kind of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    /// Disposable address handed to a third party.
    Alias,
    /// Per-correspondent address minted so replies route back.
    ReplyAlias,
    /// A user's real mailbox.
    Protected,
    /// A third-party correspondent's real address.
    External,
}

impl AddressKind {
    /// All kinds, in their numeric order.
    pub const ALL: [AddressKind; 4] = [
        AddressKind::Alias,
        AddressKind::ReplyAlias,
        AddressKind::Protected,
        AddressKind::External,
    ];

    /// Convert kind to its storage string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::Alias => "alias",
            AddressKind::ReplyAlias => "reply_alias",
            AddressKind::Protected => "protected",
            AddressKind::External => "external",
        }
    }

    /// Whether addresses of this kind must carry a forward address.
    pub fn forwards(&self) -> bool {
        matches!(self, AddressKind::Alias | AddressKind::ReplyAlias)
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressKind {
    type Err = OvooError;

    /// Accepts the storage names as well as the numeric codes `0..=3` used by
    /// list filters.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "alias" | "0" => Ok(AddressKind::Alias),
            "reply_alias" | "1" => Ok(AddressKind::ReplyAlias),
            "protected" | "2" => Ok(AddressKind::Protected),
            "external" | "3" => Ok(AddressKind::External),
            _ => Err(OvooError::Validation(format!(
                "unsupported address type '{s}'"
            ))),
        }
    }
}

/// Free-form information attached to an address by its owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressMetadata {
    pub comment: String,
    pub service_name: String,
}

/// One mailbox-like identity.
///
/// `forward_address` is a reference by id, never ownership; it is resolved
/// through the store when needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: Id,
    pub kind: AddressKind,
    pub email: Email,
    pub forward_address: Option<Id>,
    pub owner: Id,
    pub metadata: AddressMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Id>,
}

impl Address {
    /// Build a fresh address with a new id and current timestamps.
    pub fn new(kind: AddressKind, email: Email, owner: Id) -> Self {
        let now = Utc::now();
        Self {
            id: Id::new(),
            kind,
            email,
            forward_address: None,
            owner,
            metadata: AddressMetadata::default(),
            created_at: now,
            updated_at: now,
            updated_by: None,
        }
    }

    /// Set the forward address.
    pub fn with_forward_address(mut self, forward: Id) -> Self {
        self.forward_address = Some(forward);
        self
    }

    /// Set the metadata.
    pub fn with_metadata(mut self, metadata: AddressMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Record who last changed this address.
    pub fn with_updated_by(mut self, user: Id) -> Self {
        self.updated_by = Some(user);
        self
    }

    /// Check id, email, owner and the forward-pointer rule.
    ///
    /// Protected and External addresses must not forward anywhere; Alias and
    /// ReplyAlias addresses must forward to a valid id.
    pub fn validate(&self) -> Result<()> {
        self.id.validate()?;

        match (self.kind.forwards(), &self.forward_address) {
            (false, Some(_)) => {
                return Err(OvooError::Validation(format!(
                    "{} address can not have forward address set",
                    self.kind
                )));
            }
            (true, None) => {
                return Err(OvooError::Validation(format!(
                    "{} address must have forward address set",
                    self.kind
                )));
            }
            (true, Some(forward)) => {
                forward.validate().map_err(|e| {
                    OvooError::Validation(format!("validating address forward address: {e}"))
                })?;
            }
            (false, None) => {}
        }

        self.email
            .validate()
            .map_err(|e| OvooError::Validation(format!("validating address email: {e}")))?;

        self.owner
            .validate()
            .map_err(|e| OvooError::Validation(format!("validating owner: {e}")))?;

        Ok(())
    }
}
