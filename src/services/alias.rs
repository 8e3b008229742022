//! Alias service.

use chrono::Utc;
use tracing::{info, warn};

use super::{restrict_owners, MetadataCmd};
use crate::auth::permission::{require, Action, Resource};
use crate::db::{TransactionalStore, UnitOfWork};
use crate::entities::{
    gen_alias, Address, AddressFilter, AddressKind, Id, PaginationMetadata, User,
};
use crate::services::cascade;
use crate::{OvooError, Result};

/// Attempts at drawing an alias email that is not taken yet.
const MAX_GENERATION_ATTEMPTS: usize = 5;

/// Request to create an alias for a protected address.
#[derive(Debug, Clone, Default)]
pub struct AliasCreateCmd {
    pub protected_address_id: Id,
    pub metadata: MetadataCmd,
}

/// Request to change the metadata of an alias.
#[derive(Debug, Clone, Default)]
pub struct AliasUpdateCmd {
    pub alias_id: Id,
    pub metadata: MetadataCmd,
}

/// Manages alias addresses.
#[derive(Debug, Clone)]
pub struct AliasService<S> {
    domain: String,
    dictionary: Vec<String>,
    store: S,
}

impl<S: TransactionalStore> AliasService<S> {
    /// Fails with a configuration error when the domain is shorter than two
    /// characters or the dictionary is empty.
    pub fn new(domain: impl Into<String>, dictionary: Vec<String>, store: S) -> Result<Self> {
        let domain = domain.into();
        if domain.len() < 2 {
            return Err(OvooError::Config(
                "alias domain should be at least 2 characters long".to_string(),
            ));
        }
        if dictionary.is_empty() {
            return Err(OvooError::Config("dictionary can not be empty".to_string()));
        }
        Ok(Self {
            domain,
            dictionary,
            store,
        })
    }

    /// Create a new alias forwarding to one of the actor's protected
    /// addresses.
    pub async fn create(&self, actor: &User, cmd: AliasCreateCmd) -> Result<Address> {
        require(actor, Action::Create, Resource::Alias, None)?;

        let protected = match self.store.get_address_by_id(&cmd.protected_address_id).await {
            Ok(address) => address,
            Err(e) if e.is_not_found() => {
                return Err(OvooError::Validation(format!(
                    "protected address '{}' not found",
                    cmd.protected_address_id
                )))
            }
            Err(e) => return Err(e),
        };
        if protected.kind != AddressKind::Protected {
            return Err(OvooError::Validation(format!(
                "address '{}' is not a protected address",
                protected.id
            )));
        }
        require(
            actor,
            Action::Get,
            Resource::ProtectedAddress,
            Some(&protected.owner),
        )?;

        let mut metadata = Default::default();
        cmd.metadata.apply_to(&mut metadata);

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let email = gen_alias(&self.domain, &self.dictionary)?;
            let alias = Address::new(AddressKind::Alias, email, actor.id.clone())
                .with_forward_address(protected.id.clone())
                .with_metadata(metadata.clone())
                .with_updated_by(actor.id.clone());
            alias.validate()?;

            match self.store.create_address(&alias).await {
                Ok(()) => {
                    info!(
                        alias = %alias.email,
                        protected = %protected.email,
                        owner = %actor.id,
                        "alias created"
                    );
                    return Ok(alias);
                }
                Err(e) if e.is_duplicate() => {
                    warn!(alias = %alias.email, attempt, "generated alias already taken");
                }
                Err(e) => return Err(e),
            }
        }

        Err(OvooError::General(
            "could not generate a unique alias".to_string(),
        ))
    }

    /// Update the comment and service name of an alias.
    pub async fn update(&self, actor: &User, cmd: AliasUpdateCmd) -> Result<Address> {
        let mut alias = match self.fetch(&cmd.alias_id).await {
            Ok(alias) => alias,
            Err(e) if e.is_not_found() => return Err(OvooError::Validation(e.to_string())),
            Err(e) => return Err(e),
        };
        require(actor, Action::Update, Resource::Alias, Some(&alias.owner))?;

        cmd.metadata.apply_to(&mut alias.metadata);
        alias.updated_at = Utc::now();
        alias.updated_by = Some(actor.id.clone());
        alias.validate()?;

        self.store.update_address(&alias).await?;
        Ok(alias)
    }

    pub async fn get_by_id(&self, actor: &User, id: &Id) -> Result<Address> {
        id.validate()?;
        let alias = self.fetch(id).await?;
        require(actor, Action::Get, Resource::Alias, Some(&alias.owner))?;
        Ok(alias)
    }

    /// List aliases.
    ///
    /// Non-admins only ever see their own aliases. Admins see their own by
    /// default, anyone's listed in `owners`, or everything with owner `all`.
    pub async fn get_all(
        &self,
        actor: &User,
        mut filter: AddressFilter,
    ) -> Result<(Vec<Address>, PaginationMetadata)> {
        require(actor, Action::List, Resource::Alias, None)?;
        filter.kinds = vec![AddressKind::Alias];
        restrict_owners(actor, &mut filter);

        let (aliases, count) = self.store.get_all_addresses(&filter).await?;
        Ok((aliases, filter.filter.metadata(count)))
    }

    /// Delete an alias together with its chains and reply aliases.
    pub async fn delete_by_id(&self, actor: &User, id: &Id) -> Result<()> {
        id.validate()?;
        let alias = self.fetch(id).await?;
        require(actor, Action::Delete, Resource::Alias, Some(&alias.owner))?;

        let tx = self.store.begin().await?;
        cascade::delete_alias_ids(&tx, std::slice::from_ref(&alias.id)).await?;
        tx.commit().await?;

        info!(alias = %alias.email, actor = %actor.id, "alias deleted");
        Ok(())
    }

    /// Load an address and make sure it is an alias.
    async fn fetch(&self, id: &Id) -> Result<Address> {
        let address = self.store.get_address_by_id(id).await?;
        if address.kind != AddressKind::Alias {
            return Err(OvooError::NotFound(format!("alias '{id}'")));
        }
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AddressRepository, ChainRepository, Database, SqliteStore};
    use crate::entities::{Chain, Email, Role};
    use crate::services::ChainService;

    struct Fixture {
        _db: Database,
        store: SqliteStore,
        service: AliasService<SqliteStore>,
        user: User,
        protected: Address,
    }

    async fn setup() -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let store = db.store();
        let user = User::new(Role::Regular, "alice");
        let protected = Address::new(
            AddressKind::Protected,
            Email::from("alice@mail.com"),
            user.id.clone(),
        );
        store.create_address(&protected).await.unwrap();

        let dictionary: Vec<String> = [
            "apple", "river", "stone", "cloud", "maple", "otter", "amber", "cedar", "delta",
            "ember", "fjord", "grove",
        ]
        .iter()
        .map(|w| w.to_string())
        .collect();
        Fixture {
            service: AliasService::new("x.org", dictionary, store.clone()).unwrap(),
            _db: db,
            store,
            user,
            protected,
        }
    }

    fn create_cmd(protected: &Address) -> AliasCreateCmd {
        AliasCreateCmd {
            protected_address_id: protected.id.clone(),
            metadata: MetadataCmd {
                comment: Some("  newsletter  ".to_string()),
                service_name: Some(" shop ".to_string()),
            },
        }
    }

    #[tokio::test]
    async fn test_new_checks_configuration() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(matches!(
            AliasService::new("x", vec!["w".to_string()], db.store()),
            Err(OvooError::Config(_))
        ));
        assert!(matches!(
            AliasService::new("x.org", Vec::new(), db.store()),
            Err(OvooError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_create_alias() {
        let f = setup().await;
        let alias = f.service.create(&f.user, create_cmd(&f.protected)).await.unwrap();

        assert_eq!(alias.kind, AddressKind::Alias);
        assert_eq!(alias.owner, f.user.id);
        assert_eq!(alias.updated_by.as_ref(), Some(&f.user.id));
        assert_eq!(alias.forward_address.as_ref(), Some(&f.protected.id));
        assert_eq!(alias.metadata.comment, "newsletter");
        assert_eq!(alias.metadata.service_name, "shop");
        assert_eq!(alias.email.domain(), Some("x.org"));

        let stored = f.service.get_by_id(&f.user, &alias.id).await.unwrap();
        assert_eq!(stored.email, alias.email);
    }

    #[tokio::test]
    async fn test_create_requires_protected_address() {
        let f = setup().await;
        let cmd = AliasCreateCmd {
            protected_address_id: Id::new(),
            ..AliasCreateCmd::default()
        };
        assert!(matches!(
            f.service.create(&f.user, cmd).await,
            Err(OvooError::Validation(_))
        ));

        let external = Address::new(AddressKind::External, Email::from("e@y.com"), f.user.id.clone());
        f.store.create_address(&external).await.unwrap();
        let cmd = AliasCreateCmd {
            protected_address_id: external.id.clone(),
            ..AliasCreateCmd::default()
        };
        assert!(matches!(
            f.service.create(&f.user, cmd).await,
            Err(OvooError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_for_foreign_protected_address_denied() {
        let f = setup().await;
        let mallory = User::new(Role::Regular, "mallory");
        assert!(matches!(
            f.service.create(&mallory, create_cmd(&f.protected)).await,
            Err(OvooError::NotAuthorized)
        ));

        let admin = User::new(Role::Admin, "admin");
        let alias = f.service.create(&admin, create_cmd(&f.protected)).await.unwrap();
        assert_eq!(alias.owner, admin.id);
    }

    #[tokio::test]
    async fn test_milter_cannot_manage_aliases() {
        let f = setup().await;
        let milter = User::new(Role::Milter, "milter");
        assert!(matches!(
            f.service.create(&milter, create_cmd(&f.protected)).await,
            Err(OvooError::NotAuthorized)
        ));
        assert!(matches!(
            f.service.get_all(&milter, AddressFilter::default()).await,
            Err(OvooError::NotAuthorized)
        ));
    }

    #[tokio::test]
    async fn test_update_metadata() {
        let f = setup().await;
        let alias = f.service.create(&f.user, create_cmd(&f.protected)).await.unwrap();

        let updated = f
            .service
            .update(
                &f.user,
                AliasUpdateCmd {
                    alias_id: alias.id.clone(),
                    metadata: MetadataCmd {
                        comment: Some(" changed ".to_string()),
                        service_name: None,
                    },
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.metadata.comment, "changed");
        assert_eq!(updated.metadata.service_name, "shop");

        let stored = f.store.get_address_by_id(&alias.id).await.unwrap();
        assert_eq!(stored.metadata, updated.metadata);
        assert_eq!(stored.email, alias.email);
    }

    #[tokio::test]
    async fn test_update_rules() {
        let f = setup().await;
        let alias = f.service.create(&f.user, create_cmd(&f.protected)).await.unwrap();

        let other = User::new(Role::Regular, "bob");
        let cmd = AliasUpdateCmd {
            alias_id: alias.id.clone(),
            ..AliasUpdateCmd::default()
        };
        assert!(matches!(
            f.service.update(&other, cmd).await,
            Err(OvooError::NotAuthorized)
        ));

        let cmd = AliasUpdateCmd {
            alias_id: Id::new(),
            ..AliasUpdateCmd::default()
        };
        assert!(matches!(
            f.service.update(&f.user, cmd).await,
            Err(OvooError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_get_by_id_rules() {
        let f = setup().await;
        let alias = f.service.create(&f.user, create_cmd(&f.protected)).await.unwrap();

        let other = User::new(Role::Regular, "bob");
        assert!(matches!(
            f.service.get_by_id(&other, &alias.id).await,
            Err(OvooError::NotAuthorized)
        ));
        assert!(f
            .service
            .get_by_id(&f.user, &f.protected.id)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(matches!(
            f.service.get_by_id(&f.user, &Id::from("nope")).await,
            Err(OvooError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_get_all_scopes_owners() {
        let f = setup().await;
        f.service.create(&f.user, create_cmd(&f.protected)).await.unwrap();
        f.service.create(&f.user, create_cmd(&f.protected)).await.unwrap();

        let admin = User::new(Role::Admin, "admin");
        f.service.create(&admin, create_cmd(&f.protected)).await.unwrap();

        let (mine, meta) = f
            .service
            .get_all(&f.user, AddressFilter::default().with_owner(admin.id.clone()))
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|a| a.owner == f.user.id));
        assert_eq!(meta, PaginationMetadata::default());

        let (own, _) = f
            .service
            .get_all(&admin, AddressFilter::default())
            .await
            .unwrap();
        assert_eq!(own.len(), 1);

        let (all, _) = f
            .service
            .get_all(&admin, AddressFilter::default().with_owner(Id::from("all")))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|a| a.kind == AddressKind::Alias));
    }

    #[tokio::test]
    async fn test_delete_removes_chains() {
        let f = setup().await;
        let alias = f.service.create(&f.user, create_cmd(&f.protected)).await.unwrap();

        let milter = User::new(Role::Milter, "milter");
        let chains = ChainService::new("x.org", f.store.clone()).unwrap();
        let forward: Chain = chains
            .create(&milter, "ext@y.com", alias.email.as_str(), None)
            .await
            .unwrap();

        let other = User::new(Role::Regular, "bob");
        assert!(matches!(
            f.service.delete_by_id(&other, &alias.id).await,
            Err(OvooError::NotAuthorized)
        ));

        f.service.delete_by_id(&f.user, &alias.id).await.unwrap();

        assert!(f.store.get_address_by_id(&alias.id).await.is_err());
        assert!(f
            .store
            .get_address_by_id(&forward.from_address.id)
            .await
            .is_err());
        assert!(f.store.get_chain_by_hash(&forward.hash).await.is_err());
        assert!(f.store.get_address_by_id(&f.protected.id).await.is_ok());
        assert!(f
            .store
            .get_address_by_id(&forward.orig_from_address.id)
            .await
            .is_ok());
    }
}
