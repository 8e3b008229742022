//! Chain graph service.
//!
//! When mail first arrives from an external sender at an alias, `create`
//! builds a pair of chains: the forward chain delivers the message to the
//! protected address behind the alias from a freshly minted reply alias, and
//! the reverse chain carries replies back out through the alias.

use tracing::{debug, info};

use crate::auth::permission::{require, Action, Resource};
use crate::db::{AddressRepository, ChainRepository, TransactionalStore, UnitOfWork};
use crate::entities::{
    gen_reply_alias, Address, AddressKind, Chain, ChainFilter, Email, Hash, Id,
    PaginationMetadata, User,
};
use crate::{OvooError, Result};

/// Builds, looks up and removes chains.
#[derive(Debug, Clone)]
pub struct ChainService<S> {
    domain: String,
    store: S,
}

impl<S: TransactionalStore> ChainService<S> {
    /// Fails with a configuration error when `domain` is empty.
    pub fn new(domain: impl Into<String>, store: S) -> Result<Self> {
        let domain = domain.into();
        if domain.is_empty() {
            return Err(OvooError::Config("domain should be defined".to_string()));
        }
        Ok(Self { domain, store })
    }

    /// Get or build the chain pair for mail from `from_email` to the alias
    /// `to_email` and return the forward chain.
    ///
    /// New addresses are owned by `owner`, or by the alias owner when `None`.
    /// Calling this again for the same pair returns the stored chain.
    pub async fn create(
        &self,
        actor: &User,
        from_email: &str,
        to_email: &str,
        owner: Option<&Id>,
    ) -> Result<Chain> {
        require(actor, Action::Create, Resource::Chain, None)?;

        let hash = Hash::new(from_email, to_email);
        if let Some(chain) = find_chain(&self.store, &hash).await? {
            debug!(%hash, "chain already exists");
            return Ok(chain);
        }

        let alias = self.destination_alias(to_email).await?;
        let protected = match &alias.forward_address {
            Some(id) => self.store.get_address_by_id(id).await?,
            None => {
                return Err(OvooError::Validation(format!(
                    "creating chain: alias '{to_email}' has no forward address"
                )))
            }
        };
        let owner = owner.cloned().unwrap_or_else(|| alias.owner.clone());

        match self
            .build_chains(from_email, to_email, &alias, &protected, &owner)
            .await
        {
            Ok(chain) => {
                info!(
                    %hash,
                    from = from_email,
                    to = to_email,
                    reply_alias = %chain.from_address.email,
                    "chain pair created"
                );
                Ok(chain)
            }
            // Another caller created the same pair first.
            Err(e) if e.is_duplicate() => {
                debug!(%hash, "lost chain creation race, fetching stored chain");
                self.store.get_chain_by_hash(&hash).await.map_err(|fetch_err| {
                    if fetch_err.is_not_found() {
                        e
                    } else {
                        fetch_err
                    }
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Look up the Alias address `to_email`.
    async fn destination_alias(&self, to_email: &str) -> Result<Address> {
        let candidates = self
            .store
            .get_addresses_by_email(&Email::from(to_email))
            .await?;
        if candidates.is_empty() {
            return Err(OvooError::Validation(format!(
                "creating chain: destination alias not found: '{to_email}'"
            )));
        }
        candidates
            .into_iter()
            .find(|a| a.kind == AddressKind::Alias)
            .ok_or_else(|| {
                OvooError::Validation(
                    "creating chain: destination address is not of type Alias".to_string(),
                )
            })
    }

    /// Write the external address, the reply alias and both chains in one
    /// transaction. Addresses and chains already stored are reused, so a pair
    /// with one direction deleted is completed rather than rejected.
    async fn build_chains(
        &self,
        from_email: &str,
        to_email: &str,
        alias: &Address,
        protected: &Address,
        owner: &Id,
    ) -> Result<Chain> {
        let tx = self.store.begin().await?;

        let sender = Email::from(from_email);
        let external = match tx
            .get_addresses_by_email(&sender)
            .await?
            .into_iter()
            .find(|a| a.kind == AddressKind::External)
        {
            Some(existing) => existing,
            None => {
                let external = Address::new(AddressKind::External, sender.clone(), owner.clone());
                external.validate()?;
                tx.create_address(&external).await?;
                external
            }
        };

        let (reply_email, _) = gen_reply_alias(&sender, &Email::from(to_email), &self.domain)?;
        let reply_alias = match tx
            .get_addresses_by_email(&reply_email)
            .await?
            .into_iter()
            .find(|a| a.kind == AddressKind::ReplyAlias)
        {
            Some(existing) => existing,
            None => {
                let reply = Address::new(AddressKind::ReplyAlias, reply_email, owner.clone())
                    .with_forward_address(external.id.clone());
                reply.validate()?;
                tx.create_address(&reply).await?;
                reply
            }
        };

        let forward = Chain::new(
            reply_alias.clone(),
            protected.clone(),
            external.clone(),
            alias.clone(),
        );
        let reverse = Chain::new(
            alias.clone(),
            external,
            protected.clone(),
            reply_alias,
        );
        forward.validate()?;
        reverse.validate()?;

        let stored_forward = find_chain(&tx, &forward.hash).await?;
        let stored_reverse = find_chain(&tx, &reverse.hash).await?;
        let mut missing = Vec::with_capacity(2);
        if stored_forward.is_none() {
            missing.push(forward.clone());
        }
        if stored_reverse.is_none() {
            missing.push(reverse);
        } else if stored_forward.is_none() {
            debug!(hash = %forward.hash, "restoring forward chain of existing pair");
        }

        tx.batch_create_chains(&missing).await?;
        tx.commit().await?;
        Ok(stored_forward.unwrap_or(forward))
    }

    /// Fetch a chain by its hash. Admin and milter only.
    pub async fn get_by_hash(&self, actor: &User, hash: &Hash) -> Result<Chain> {
        require(actor, Action::Get, Resource::Chain, None)?;
        hash.validate()?;
        self.store.get_chain_by_hash(hash).await
    }

    /// Delete one chain and return it. Its counterpart and addresses are
    /// left in place.
    pub async fn delete_by_hash(&self, actor: &User, hash: &Hash) -> Result<Chain> {
        require(actor, Action::Delete, Resource::Chain, None)?;
        hash.validate()?;

        let tx = self.store.begin().await?;
        let chain = tx.get_chain_by_hash(hash).await?;
        tx.delete_chain(hash).await?;
        tx.commit().await?;

        info!(%hash, "chain deleted");
        Ok(chain)
    }

    /// List chains a page at a time. Admin and milter only.
    pub async fn get_all(
        &self,
        actor: &User,
        filter: &ChainFilter,
    ) -> Result<(Vec<Chain>, PaginationMetadata)> {
        require(actor, Action::List, Resource::Chain, None)?;
        let (chains, count) = self.store.get_chains_by_filter(filter).await?;
        Ok((chains, filter.filter.metadata(count)))
    }

    /// Domain reply aliases are minted in.
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

/// `None` when no chain has this hash.
async fn find_chain<R: ChainRepository + ?Sized>(
    repo: &R,
    hash: &Hash,
) -> Result<Option<Chain>> {
    match repo.get_chain_by_hash(hash).await {
        Ok(chain) => Ok(Some(chain)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
