//! SQLite implementation of the repository traits.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::repository_traits::{
    AddressRepository, ApiTokenRepository, ChainRepository, TransactionalStore, UnitOfWork,
    UserRepository,
};
use super::{address, api_token, chain, user};
use crate::entities::{
    Address, AddressFilter, ApiToken, ApiTokenFilter, Chain, ChainFilter, Email, Hash, Id, User,
    UserFilter,
};
use crate::Result;

/// Store backed by a connection pool. Each call runs on its own connection.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }
}

/// Store bound to one open transaction.
///
/// Dropping it without calling [`UnitOfWork::commit`] rolls back.
pub struct SqliteTransaction {
    tx: Mutex<Transaction<'static, Sqlite>>,
}

impl SqliteTransaction {
    async fn conn(&self) -> Result<MutexGuard<'_, Transaction<'static, Sqlite>>> {
        Ok(self.tx.lock().await)
    }
}

impl std::fmt::Debug for SqliteTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTransaction").finish()
    }
}

#[async_trait]
impl TransactionalStore for SqliteStore {
    type Transaction = SqliteTransaction;

    /// Start a write transaction. The write lock is taken up front so
    /// concurrent writers queue on the busy timeout instead of failing when
    /// a read lock can not be upgraded.
    async fn begin(&self) -> Result<SqliteTransaction> {
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        debug!("transaction started");
        Ok(SqliteTransaction { tx: Mutex::new(tx) })
    }
}

#[async_trait]
impl UnitOfWork for SqliteTransaction {
    async fn commit(self) -> Result<()> {
        self.tx.into_inner().commit().await?;
        debug!("transaction committed");
        Ok(())
    }
}

/// Implement the four repositories for a type with an
/// `async fn conn(&self) -> Result<impl DerefMut<Target = SqliteConnection>>`.
macro_rules! impl_repositories {
    ($store:ty) => {
        #[async_trait]
        impl AddressRepository for $store {
            async fn create_address(&self, a: &Address) -> Result<()> {
                address::create(&mut *self.conn().await?, a).await
            }

            async fn batch_create_addresses(&self, addresses: &[Address]) -> Result<()> {
                address::batch_create(&mut *self.conn().await?, addresses).await
            }

            async fn update_address(&self, a: &Address) -> Result<()> {
                address::update(&mut *self.conn().await?, a).await
            }

            async fn delete_address(&self, id: &Id) -> Result<()> {
                address::delete(&mut *self.conn().await?, id).await
            }

            async fn batch_delete_addresses(&self, ids: &[Id]) -> Result<()> {
                address::batch_delete(&mut *self.conn().await?, ids).await
            }

            async fn get_address_by_id(&self, id: &Id) -> Result<Address> {
                address::get_by_id(&mut *self.conn().await?, id).await
            }

            async fn get_addresses_by_email(&self, email: &Email) -> Result<Vec<Address>> {
                address::get_by_email(&mut *self.conn().await?, email).await
            }

            async fn get_all_addresses(
                &self,
                filter: &AddressFilter,
            ) -> Result<(Vec<Address>, i64)> {
                address::get_all(&mut *self.conn().await?, filter).await
            }
        }

        #[async_trait]
        impl ChainRepository for $store {
            async fn create_chain(&self, c: &Chain) -> Result<()> {
                chain::create(&mut *self.conn().await?, c).await
            }

            async fn batch_create_chains(&self, chains: &[Chain]) -> Result<()> {
                chain::batch_create(&mut *self.conn().await?, chains).await
            }

            async fn get_chain_by_hash(&self, hash: &Hash) -> Result<Chain> {
                chain::get_by_hash(&mut *self.conn().await?, hash).await
            }

            async fn get_chains_by_filter(
                &self,
                filter: &ChainFilter,
            ) -> Result<(Vec<Chain>, i64)> {
                chain::get_by_filter(&mut *self.conn().await?, filter).await
            }

            async fn delete_chain(&self, hash: &Hash) -> Result<()> {
                chain::delete(&mut *self.conn().await?, hash).await
            }

            async fn batch_delete_chains(&self, hashes: &[Hash]) -> Result<()> {
                chain::batch_delete(&mut *self.conn().await?, hashes).await
            }
        }

        #[async_trait]
        impl UserRepository for $store {
            async fn create_user(&self, u: &User) -> Result<()> {
                user::create(&mut *self.conn().await?, u).await
            }

            async fn get_user_by_id(&self, id: &Id) -> Result<User> {
                user::get_by_id(&mut *self.conn().await?, id).await
            }

            async fn get_user_by_login(&self, login: &str) -> Result<User> {
                user::get_by_login(&mut *self.conn().await?, login).await
            }

            async fn get_all_users(&self, filter: &UserFilter) -> Result<(Vec<User>, i64)> {
                user::get_all(&mut *self.conn().await?, filter).await
            }

            async fn update_user(&self, u: &User) -> Result<()> {
                user::update(&mut *self.conn().await?, u).await
            }

            async fn delete_user(&self, id: &Id) -> Result<()> {
                user::delete(&mut *self.conn().await?, id).await
            }
        }

        #[async_trait]
        impl ApiTokenRepository for $store {
            async fn create_api_token(&self, token: &ApiToken) -> Result<()> {
                api_token::create(&mut *self.conn().await?, token).await
            }

            async fn get_api_token_by_id(&self, id: &Id) -> Result<ApiToken> {
                api_token::get_by_id(&mut *self.conn().await?, id).await
            }

            async fn get_api_tokens_for_user(
                &self,
                owner: &Id,
                filter: &ApiTokenFilter,
            ) -> Result<(Vec<ApiToken>, i64)> {
                api_token::get_for_user(&mut *self.conn().await?, owner, filter).await
            }

            async fn update_api_token(&self, token: &ApiToken) -> Result<()> {
                api_token::update(&mut *self.conn().await?, token).await
            }

            async fn delete_api_token(&self, id: &Id) -> Result<()> {
                api_token::delete(&mut *self.conn().await?, id).await
            }
        }
    };
}

impl_repositories!(SqliteStore);
impl_repositories!(SqliteTransaction);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::entities::{AddressKind, Role};

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let db = Database::open_in_memory().await.unwrap();
        let store = db.store();

        let tx = store.begin().await.unwrap();
        let u = User::new(Role::Regular, "u");
        tx.create_user(&u).await.unwrap();
        assert_eq!(tx.get_user_by_id(&u.id).await.unwrap().login, "u");
        tx.commit().await.unwrap();

        assert_eq!(store.get_user_by_login("u").await.unwrap().id, u.id);
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let db = Database::open_in_memory().await.unwrap();
        let store = db.store();
        let addr = Address::new(AddressKind::Protected, Email::from("p@x.org"), Id::new());

        {
            let tx = store.begin().await.unwrap();
            tx.create_address(&addr).await.unwrap();
        }

        assert!(store
            .get_address_by_id(&addr.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_writers_queue_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("ovoo.db")).await.unwrap();
        let store = db.store();

        let first = store.begin().await.unwrap();
        let a = User::new(Role::Regular, "a");
        first.create_user(&a).await.unwrap();

        let other = store.clone();
        let b = User::new(Role::Regular, "b");
        let b_id = b.id.clone();
        let second = tokio::spawn(async move {
            let tx = other.begin().await?;
            tx.create_user(&b).await?;
            tx.commit().await
        });

        first.commit().await.unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(store.get_user_by_login("a").await.unwrap().id, a.id);
        assert_eq!(store.get_user_by_login("b").await.unwrap().id, b_id);
    }
}
