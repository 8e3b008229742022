//! User service.

use chrono::Utc;
use tracing::{debug, info};

use crate::auth::permission::{require, Action, Resource};
use crate::auth::{hash_password, verify_password};
use crate::db::{TransactionalStore, UnitOfWork, UserRepository};
use crate::entities::{Id, PaginationMetadata, Role, User, UserFilter};
use crate::services::cascade;
use crate::{OvooError, Result};

/// Request to create a user.
#[derive(Debug, Clone, Default)]
pub struct UserCreateCmd {
    pub login: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    /// Plain-text password; `None` creates an account without local login.
    pub password: Option<String>,
}

/// Request to change a user. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateCmd {
    pub user_id: Id,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

/// Manages user accounts.
#[derive(Debug, Clone)]
pub struct UserService<S> {
    store: S,
}

impl<S: TransactionalStore> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a user. Only administrators may do this.
    pub async fn create(&self, actor: &User, cmd: UserCreateCmd) -> Result<User> {
        require(actor, Action::Create, Resource::User, None)?;
        let user = self.insert(cmd).await?;
        info!(login = %user.login, role = %user.role, actor = %actor.id, "user created");
        Ok(user)
    }

    /// Create a user without an acting user.
    ///
    /// Only for bootstrap paths such as the default administrator; never
    /// reachable from a request.
    pub async fn create_privileged(&self, cmd: UserCreateCmd) -> Result<User> {
        let user = self.insert(cmd).await?;
        info!(login = %user.login, role = %user.role, "user created (privileged)");
        Ok(user)
    }

    async fn insert(&self, cmd: UserCreateCmd) -> Result<User> {
        let mut user = User::new(cmd.role, cmd.login.trim())
            .with_name(cmd.first_name.trim(), cmd.last_name.trim());
        user.validate()?;
        if let Some(password) = &cmd.password {
            user.password_hash = hash_password(password)?;
        }

        self.store.create_user(&user).await?;
        Ok(user)
    }

    pub async fn get_by_id(&self, actor: &User, id: &Id) -> Result<User> {
        require(actor, Action::Get, Resource::User, Some(id))?;
        id.validate()?;
        self.store.get_user_by_id(id).await
    }

    pub async fn get_by_login(&self, actor: &User, login: &str) -> Result<User> {
        let user = self.store.get_user_by_login(login).await?;
        require(actor, Action::Get, Resource::User, Some(&user.id))?;
        Ok(user)
    }

    /// Check a login/password pair and return the matching user.
    ///
    /// Unknown logins, accounts without a password and wrong passwords all
    /// yield [`OvooError::NotAuthorized`].
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User> {
        let user = match self.store.get_user_by_login(login).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                debug!(login, "authentication failed: unknown login");
                return Err(OvooError::NotAuthorized);
            }
            Err(e) => return Err(e),
        };
        if user.password_hash.is_empty() {
            debug!(login, "authentication failed: no password set");
            return Err(OvooError::NotAuthorized);
        }
        verify_password(password, &user.password_hash)?;
        Ok(user)
    }

    /// List users. Administrators only.
    pub async fn get_all(
        &self,
        actor: &User,
        filter: &UserFilter,
    ) -> Result<(Vec<User>, PaginationMetadata)> {
        require(actor, Action::List, Resource::User, None)?;
        let (users, count) = self.store.get_all_users(filter).await?;
        Ok((users, filter.filter.metadata(count)))
    }

    /// Update names, role or password. Only administrators may change roles.
    pub async fn update(&self, actor: &User, cmd: UserUpdateCmd) -> Result<User> {
        require(actor, Action::Update, Resource::User, Some(&cmd.user_id))?;
        cmd.user_id.validate()?;
        let mut user = self.store.get_user_by_id(&cmd.user_id).await?;

        if let Some(role) = cmd.role {
            if role != user.role && !actor.is_admin() {
                return Err(OvooError::NotAuthorized);
            }
            user.role = role;
        }
        if let Some(first_name) = cmd.first_name {
            user.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = cmd.last_name {
            user.last_name = last_name.trim().to_string();
        }
        if let Some(password) = &cmd.password {
            user.password_hash = hash_password(password)?;
        }
        user.updated_at = Utc::now();
        user.validate()?;

        self.store.update_user(&user).await?;
        info!(login = %user.login, actor = %actor.id, "user updated");
        Ok(user)
    }

    /// Delete a user together with their protected addresses, aliases,
    /// chains and API tokens. Administrators may not delete themselves.
    pub async fn delete(&self, actor: &User, id: &Id) -> Result<User> {
        require(actor, Action::Delete, Resource::User, Some(id))?;
        id.validate()?;
        let user = self.store.get_user_by_id(id).await?;

        let tx = self.store.begin().await?;
        cascade::delete_protected_addresses_for_user(&tx, &user.id).await?;
        tx.delete_user(&user.id).await?;
        tx.commit().await?;

        info!(login = %user.login, actor = %actor.id, "user deleted");
        Ok(user)
    }
}
