//! Service layer for Ovoo.
//!
//! Every operation takes the acting [`User`] first, checks it against the
//! permission table and talks to the store through the repository traits.
//! [`Services`] bundles one instance of each service over a shared store.

pub mod alias;
pub mod api_token;
pub mod cascade;
pub mod chain;
pub mod protected_address;
pub mod user;

pub use alias::{AliasCreateCmd, AliasService, AliasUpdateCmd};
pub use api_token::{ApiTokenCreateCmd, ApiTokenService, ApiTokenUpdateCmd};
pub use chain::ChainService;
pub use protected_address::{
    ProtectedAddressCreateCmd, ProtectedAddressService, ProtectedAddressUpdateCmd,
};
pub use user::{UserCreateCmd, UserService, UserUpdateCmd};

use crate::db::TransactionalStore;
use crate::entities::{AddressFilter, AddressMetadata, Id, User};
use crate::Result;

/// Owner value that lets administrators list every owner's addresses.
pub const ALL_OWNERS: &str = "all";

/// Optional metadata changes carried by address commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataCmd {
    pub comment: Option<String>,
    pub service_name: Option<String>,
}

impl MetadataCmd {
    /// Overwrite the fields that are set, trimmed.
    pub(crate) fn apply_to(&self, metadata: &mut AddressMetadata) {
        if let Some(comment) = &self.comment {
            metadata.comment = comment.trim().to_string();
        }
        if let Some(service_name) = &self.service_name {
            metadata.service_name = service_name.trim().to_string();
        }
    }
}

/// Scope an address listing to the owners the actor may see.
///
/// Non-admins see only their own addresses. Admins see their own unless they
/// name other owners, and everyone's with [`ALL_OWNERS`].
pub(crate) fn restrict_owners(actor: &User, filter: &mut AddressFilter) {
    if !actor.is_admin() {
        filter.owners = vec![actor.id.clone()];
    } else if filter.owners.iter().any(|o| o.as_str() == ALL_OWNERS) {
        filter.owners.clear();
    } else if filter.owners.is_empty() {
        filter.owners = vec![actor.id.clone()];
    }
}

/// All services over one store.
#[derive(Debug, Clone)]
pub struct Services<S> {
    pub aliases: AliasService<S>,
    pub protected_addresses: ProtectedAddressService<S>,
    pub chains: ChainService<S>,
    pub users: UserService<S>,
    pub api_tokens: ApiTokenService<S>,
}

impl<S: TransactionalStore + Clone> Services<S> {
    /// Build every service. Fails with a configuration error when the domain
    /// or the dictionary is unusable.
    pub fn new(domain: &str, dictionary: Vec<String>, store: S) -> Result<Self> {
        Ok(Self {
            aliases: AliasService::new(domain, dictionary, store.clone())?,
            protected_addresses: ProtectedAddressService::new(store.clone()),
            chains: ChainService::new(domain, store.clone())?,
            users: UserService::new(store.clone()),
            api_tokens: ApiTokenService::new(store),
        })
    }
}

/// Id placeholder used in owner filters to select all owners.
pub fn all_owners() -> Id {
    Id::from(ALL_OWNERS)
}
