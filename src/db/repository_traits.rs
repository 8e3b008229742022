//! Repository trait definitions for Ovoo.
//!
//! Services depend on these traits rather than on SQLite directly. A store
//! implements all four repositories; [`TransactionalStore::begin`] hands out
//! a second store whose writes become visible only on
//! [`UnitOfWork::commit`] and are rolled back when it is dropped.
//!
//! Lookups by primary key return [`OvooError::NotFound`](crate::OvooError)
//! when the row is missing. Batch operations on an empty id list are no-ops.

use async_trait::async_trait;

use crate::entities::{
    Address, AddressFilter, ApiToken, ApiTokenFilter, Chain, ChainFilter, Email, Hash, Id, User,
    UserFilter,
};
use crate::Result;

/// Address persistence.
#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn create_address(&self, address: &Address) -> Result<()>;

    async fn batch_create_addresses(&self, addresses: &[Address]) -> Result<()>;

    /// Persist metadata and `updated_*` fields.
    async fn update_address(&self, address: &Address) -> Result<()>;

    async fn delete_address(&self, id: &Id) -> Result<()>;

    async fn batch_delete_addresses(&self, ids: &[Id]) -> Result<()>;

    async fn get_address_by_id(&self, id: &Id) -> Result<Address>;

    /// All addresses with this email, of any kind. Empty when none match.
    async fn get_addresses_by_email(&self, email: &Email) -> Result<Vec<Address>>;

    /// Matching addresses for the requested page and the total match count.
    async fn get_all_addresses(&self, filter: &AddressFilter) -> Result<(Vec<Address>, i64)>;
}

/// Chain persistence. Chains are returned with all four addresses resolved.
#[async_trait]
pub trait ChainRepository: Send + Sync {
    async fn create_chain(&self, chain: &Chain) -> Result<()>;

    /// Insert all chains in one statement.
    async fn batch_create_chains(&self, chains: &[Chain]) -> Result<()>;

    async fn get_chain_by_hash(&self, hash: &Hash) -> Result<Chain>;

    async fn get_chains_by_filter(&self, filter: &ChainFilter) -> Result<(Vec<Chain>, i64)>;

    async fn delete_chain(&self, hash: &Hash) -> Result<()>;

    async fn batch_delete_chains(&self, hashes: &[Hash]) -> Result<()>;
}

/// User persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &User) -> Result<()>;

    async fn get_user_by_id(&self, id: &Id) -> Result<User>;

    async fn get_user_by_login(&self, login: &str) -> Result<User>;

    async fn get_all_users(&self, filter: &UserFilter) -> Result<(Vec<User>, i64)>;

    async fn update_user(&self, user: &User) -> Result<()>;

    /// Delete the user; its API tokens go with it.
    async fn delete_user(&self, id: &Id) -> Result<()>;
}

/// API token persistence.
#[async_trait]
pub trait ApiTokenRepository: Send + Sync {
    async fn create_api_token(&self, token: &ApiToken) -> Result<()>;

    async fn get_api_token_by_id(&self, id: &Id) -> Result<ApiToken>;

    async fn get_api_tokens_for_user(
        &self,
        owner: &Id,
        filter: &ApiTokenFilter,
    ) -> Result<(Vec<ApiToken>, i64)>;

    /// Persist name, description and active flag.
    async fn update_api_token(&self, token: &ApiToken) -> Result<()>;

    async fn delete_api_token(&self, id: &Id) -> Result<()>;
}

/// Everything the services need from persistence.
pub trait Store: AddressRepository + ChainRepository + UserRepository + ApiTokenRepository {}

impl<T> Store for T where
    T: AddressRepository + ChainRepository + UserRepository + ApiTokenRepository
{
}

/// A store whose writes are pending until committed.
#[async_trait]
pub trait UnitOfWork: Send + Sized {
    async fn commit(self) -> Result<()>;
}

/// A store that can open transactions.
#[async_trait]
pub trait TransactionalStore: Store {
    type Transaction: Store + UnitOfWork;

    async fn begin(&self) -> Result<Self::Transaction>;
}
