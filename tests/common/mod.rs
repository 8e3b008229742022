//! Test helpers for integration tests.
//!
//! Provides a relay with one user of each role, in memory or on disk.

#![allow(dead_code)]

use std::path::Path;

use ovoo::db::{AddressRepository, ChainRepository};
use ovoo::entities::{Address, AddressFilter, ChainFilter, Email, Role, User};
use ovoo::services::{AliasCreateCmd, MetadataCmd, ProtectedAddressCreateCmd, UserCreateCmd};
use ovoo::{dictionary, Database, Services, SqliteStore};

/// Relay domain used by all tests.
pub const DOMAIN: &str = "x.org";

/// Relay with an admin, a regular user and a milter account.
pub struct TestRelay {
    pub db: Database,
    pub store: SqliteStore,
    pub services: Services<SqliteStore>,
    pub admin: User,
    pub user: User,
    pub milter: User,
}

impl TestRelay {
    pub async fn new() -> Self {
        Self::with_database(Database::open_in_memory().await.unwrap()).await
    }

    /// Relay on a WAL database file, with a real connection pool.
    pub async fn on_file(path: &Path) -> Self {
        Self::with_database(Database::open(path).await.unwrap()).await
    }

    pub async fn with_database(db: Database) -> Self {
        let store = db.store();
        let services =
            Services::new(DOMAIN, dictionary::builtin().unwrap(), store.clone()).unwrap();

        let admin = services
            .users
            .create_privileged(UserCreateCmd {
                login: "admin".to_string(),
                role: Role::Admin,
                password: Some("admin-password".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let user = services.users.create(&admin, user_cmd("alice")).await.unwrap();
        let milter = services
            .users
            .create(
                &admin,
                UserCreateCmd {
                    login: "milter".to_string(),
                    role: Role::Milter,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        Self {
            db,
            store,
            services,
            admin,
            user,
            milter,
        }
    }

    /// Create another regular user.
    pub async fn add_user(&self, login: &str) -> User {
        self.services
            .users
            .create(&self.admin, user_cmd(login))
            .await
            .unwrap()
    }

    /// Register a protected address for `owner`.
    pub async fn protect(&self, owner: &User, email: &str) -> Address {
        self.services
            .protected_addresses
            .create(
                owner,
                ProtectedAddressCreateCmd {
                    email: Email::from(email),
                    metadata: MetadataCmd::default(),
                },
            )
            .await
            .unwrap()
    }

    /// Create an alias for `protected`, owned by `owner`.
    pub async fn alias_for(&self, owner: &User, protected: &Address) -> Address {
        self.services
            .aliases
            .create(
                owner,
                AliasCreateCmd {
                    protected_address_id: protected.id.clone(),
                    metadata: MetadataCmd::default(),
                },
            )
            .await
            .unwrap()
    }

    pub async fn address_count(&self) -> i64 {
        self.store
            .get_all_addresses(&AddressFilter::default())
            .await
            .unwrap()
            .1
    }

    pub async fn chain_count(&self) -> i64 {
        self.store
            .get_chains_by_filter(&ChainFilter::default())
            .await
            .unwrap()
            .1
    }

    pub async fn address_exists(&self, address: &Address) -> bool {
        self.store.get_address_by_id(&address.id).await.is_ok()
    }
}

fn user_cmd(login: &str) -> UserCreateCmd {
    UserCreateCmd {
        login: login.to_string(),
        role: Role::Regular,
        password: Some(format!("{login}-password")),
        ..Default::default()
    }
}
