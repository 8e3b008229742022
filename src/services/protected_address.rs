//! Protected address service.

use chrono::Utc;
use tracing::info;

use super::{restrict_owners, MetadataCmd};
use crate::auth::permission::{require, Action, Resource};
use crate::db::{AddressRepository, TransactionalStore, UnitOfWork};
use crate::entities::{Address, AddressFilter, AddressKind, Email, Id, PaginationMetadata, User};
use crate::services::cascade;
use crate::{OvooError, Result};

/// Request to register a real mailbox.
#[derive(Debug, Clone, Default)]
pub struct ProtectedAddressCreateCmd {
    pub email: Email,
    pub metadata: MetadataCmd,
}

/// Request to change the metadata of a protected address.
#[derive(Debug, Clone, Default)]
pub struct ProtectedAddressUpdateCmd {
    pub protected_address_id: Id,
    pub metadata: MetadataCmd,
}

/// Manages users' real mailboxes.
#[derive(Debug, Clone)]
pub struct ProtectedAddressService<S> {
    store: S,
}

impl<S: TransactionalStore> ProtectedAddressService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register a protected address owned by the actor.
    ///
    /// Each email can be protected only once.
    pub async fn create(&self, actor: &User, cmd: ProtectedAddressCreateCmd) -> Result<Address> {
        require(actor, Action::Create, Resource::ProtectedAddress, None)?;
        cmd.email.validate()?;

        let existing = self.store.get_addresses_by_email(&cmd.email).await?;
        if existing.iter().any(|a| a.kind == AddressKind::Protected) {
            return Err(OvooError::DuplicateEntry(format!(
                "protected address '{}'",
                cmd.email
            )));
        }

        let mut metadata = Default::default();
        cmd.metadata.apply_to(&mut metadata);
        let address = Address::new(AddressKind::Protected, cmd.email, actor.id.clone())
            .with_metadata(metadata)
            .with_updated_by(actor.id.clone());
        address.validate()?;

        self.store.create_address(&address).await?;
        info!(email = %address.email, owner = %actor.id, "protected address created");
        Ok(address)
    }

    /// Update the comment and service name of a protected address.
    pub async fn update(
        &self,
        actor: &User,
        cmd: ProtectedAddressUpdateCmd,
    ) -> Result<Address> {
        let mut address = match self.fetch(&cmd.protected_address_id).await {
            Ok(address) => address,
            Err(e) if e.is_not_found() => return Err(OvooError::Validation(e.to_string())),
            Err(e) => return Err(e),
        };
        require(
            actor,
            Action::Update,
            Resource::ProtectedAddress,
            Some(&address.owner),
        )?;

        cmd.metadata.apply_to(&mut address.metadata);
        address.updated_at = Utc::now();
        address.updated_by = Some(actor.id.clone());
        address.validate()?;

        self.store.update_address(&address).await?;
        Ok(address)
    }

    pub async fn get_by_id(&self, actor: &User, id: &Id) -> Result<Address> {
        id.validate()?;
        let address = self.fetch(id).await?;
        require(
            actor,
            Action::Get,
            Resource::ProtectedAddress,
            Some(&address.owner),
        )?;
        Ok(address)
    }

    pub async fn get_by_email(&self, actor: &User, email: &Email) -> Result<Address> {
        email.validate()?;
        let address = self
            .store
            .get_addresses_by_email(email)
            .await?
            .into_iter()
            .find(|a| a.kind == AddressKind::Protected)
            .ok_or_else(|| OvooError::NotFound(format!("protected address '{email}'")))?;
        require(
            actor,
            Action::Get,
            Resource::ProtectedAddress,
            Some(&address.owner),
        )?;
        Ok(address)
    }

    /// List protected addresses, scoped to owners like alias listings.
    pub async fn get_all(
        &self,
        actor: &User,
        mut filter: AddressFilter,
    ) -> Result<(Vec<Address>, PaginationMetadata)> {
        require(actor, Action::List, Resource::ProtectedAddress, None)?;
        filter.kinds = vec![AddressKind::Protected];
        restrict_owners(actor, &mut filter);

        let (addresses, count) = self.store.get_all_addresses(&filter).await?;
        Ok((addresses, filter.filter.metadata(count)))
    }

    /// Delete a protected address with all of its aliases and their chains.
    pub async fn delete_by_id(&self, actor: &User, id: &Id) -> Result<()> {
        id.validate()?;
        let address = self.fetch(id).await?;
        require(
            actor,
            Action::Delete,
            Resource::ProtectedAddress,
            Some(&address.owner),
        )?;

        let tx = self.store.begin().await?;
        cascade::delete_aliases_for_protected_address(&tx, &address).await?;
        tx.delete_address(&address.id).await?;
        tx.commit().await?;

        info!(email = %address.email, actor = %actor.id, "protected address deleted");
        Ok(())
    }

    async fn fetch(&self, id: &Id) -> Result<Address> {
        let address = self.store.get_address_by_id(id).await?;
        if address.kind != AddressKind::Protected {
            return Err(OvooError::NotFound(format!("protected address '{id}'")));
        }
        Ok(address)
    }
}
