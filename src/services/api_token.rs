//! API token service.

use tracing::info;

use crate::auth::permission::{require, Action, Resource};
use crate::db::TransactionalStore;
use crate::entities::{ApiToken, ApiTokenFilter, Id, PaginationMetadata, User};
use crate::{OvooError, Result};

/// Request to mint a token for the actor.
#[derive(Debug, Clone, Default)]
pub struct ApiTokenCreateCmd {
    pub name: String,
    pub description: String,
    /// Lifetime in days, at least one.
    pub expire_in_days: i64,
}

/// Request to change a token. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ApiTokenUpdateCmd {
    pub token_id: Id,
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// Manages API tokens.
#[derive(Debug, Clone)]
pub struct ApiTokenService<S> {
    store: S,
}

impl<S: TransactionalStore> ApiTokenService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Mint a token owned by the actor. The returned value is the only place
    /// the secret is exposed.
    pub async fn create(&self, actor: &User, cmd: ApiTokenCreateCmd) -> Result<ApiToken> {
        require(actor, Action::Create, Resource::ApiToken, None)?;

        if cmd.name.trim().is_empty() {
            return Err(OvooError::Validation(
                "name field cannot be empty".to_string(),
            ));
        }
        if cmd.expire_in_days < 1 {
            return Err(OvooError::Validation(
                "expire_in value cannot be less than 1".to_string(),
            ));
        }

        let token = ApiToken::new(
            cmd.name.trim(),
            cmd.description.trim(),
            actor.id.clone(),
            cmd.expire_in_days,
        );
        token.validate()?;

        self.store.create_api_token(&token).await?;
        info!(
            token = %token.id,
            owner = %actor.id,
            expires_at = %token.expires_at,
            "api token created"
        );
        Ok(token)
    }

    pub async fn get_by_id(&self, actor: &User, id: &Id) -> Result<ApiToken> {
        id.validate()?;
        let token = self.store.get_api_token_by_id(id).await?;
        require(actor, Action::Get, Resource::ApiToken, Some(&token.owner))?;
        Ok(token)
    }

    /// List the actor's own tokens.
    pub async fn get_all(
        &self,
        actor: &User,
        filter: &ApiTokenFilter,
    ) -> Result<(Vec<ApiToken>, PaginationMetadata)> {
        require(actor, Action::List, Resource::ApiToken, None)?;
        let (tokens, count) = self.store.get_api_tokens_for_user(&actor.id, filter).await?;
        Ok((tokens, filter.filter.metadata(count)))
    }

    /// Rename, describe, activate or deactivate a token. Expired tokens can
    /// not be activated again.
    pub async fn update(&self, actor: &User, cmd: ApiTokenUpdateCmd) -> Result<ApiToken> {
        let mut token = match self.store.get_api_token_by_id(&cmd.token_id).await {
            Ok(token) => token,
            Err(e) if e.is_not_found() => return Err(OvooError::Validation(e.to_string())),
            Err(e) => return Err(e),
        };
        require(actor, Action::Update, Resource::ApiToken, Some(&token.owner))?;

        if let Some(name) = cmd.name {
            token.name = name.trim().to_string();
        }
        if let Some(description) = cmd.description {
            token.description = description.trim().to_string();
        }
        if let Some(active) = cmd.active {
            if active && token.is_expired() {
                return Err(OvooError::Validation(
                    "can not activate expired token".to_string(),
                ));
            }
            token.active = active;
        }
        token.validate()?;

        self.store.update_api_token(&token).await?;
        Ok(token)
    }

    pub async fn delete(&self, actor: &User, id: &Id) -> Result<()> {
        let token = self.store.get_api_token_by_id(id).await?;
        require(actor, Action::Delete, Resource::ApiToken, Some(&token.owner))?;
        self.store.delete_api_token(id).await?;
        info!(token = %id, actor = %actor.id, "api token deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::db::{ApiTokenRepository, Database, SqliteStore, UserRepository};
    use crate::entities::Role;

    async fn setup() -> (Database, SqliteStore, ApiTokenService<SqliteStore>, User) {
        let db = Database::open_in_memory().await.unwrap();
        let store = db.store();
        let owner = User::new(Role::Regular, "ada");
        store.create_user(&owner).await.unwrap();
        let service = ApiTokenService::new(store.clone());
        (db, store, service, owner)
    }

    fn cmd(name: &str, days: i64) -> ApiTokenCreateCmd {
        ApiTokenCreateCmd {
            name: name.to_string(),
            description: " laptop ".to_string(),
            expire_in_days: days,
        }
    }

    #[tokio::test]
    async fn test_create_token() {
        let (_db, _store, service, owner) = setup().await;
        let token = service.create(&owner, cmd(" cli ", 30)).await.unwrap();

        assert_eq!(token.name, "cli");
        assert_eq!(token.description, "laptop");
        assert_eq!(token.owner, owner.id);
        assert_eq!(token.token.len(), 64);
        assert!(token.is_usable());
        assert!(token.expires_at > Utc::now() + Duration::days(29));

        let fetched = service.get_by_id(&owner, &token.id).await.unwrap();
        assert_eq!(fetched.token, token.token);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (_db, _store, service, owner) = setup().await;
        assert!(matches!(
            service.create(&owner, cmd("  ", 1)).await,
            Err(OvooError::Validation(_))
        ));
        assert!(matches!(
            service.create(&owner, cmd("cli", 0)).await,
            Err(OvooError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_tokens_are_private() {
        let (_db, store, service, owner) = setup().await;
        let other = User::new(Role::Regular, "bob");
        store.create_user(&other).await.unwrap();
        let token = service.create(&owner, cmd("cli", 1)).await.unwrap();
        service.create(&other, cmd("bob's", 1)).await.unwrap();

        assert!(matches!(
            service.get_by_id(&other, &token.id).await,
            Err(OvooError::NotAuthorized)
        ));
        assert!(matches!(
            service.delete(&other, &token.id).await,
            Err(OvooError::NotAuthorized)
        ));

        let (mine, _) = service
            .get_all(&owner, &ApiTokenFilter::default())
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, token.id);

        let admin = User::new(Role::Admin, "root");
        assert!(service.get_by_id(&admin, &token.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_token() {
        let (_db, _store, service, owner) = setup().await;
        let token = service.create(&owner, cmd("cli", 1)).await.unwrap();

        let updated = service
            .update(
                &owner,
                ApiTokenUpdateCmd {
                    token_id: token.id.clone(),
                    name: Some(" ci ".to_string()),
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "ci");
        assert_eq!(updated.description, "laptop");
        assert!(!updated.active);

        let reactivated = service
            .update(
                &owner,
                ApiTokenUpdateCmd {
                    token_id: token.id.clone(),
                    active: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(reactivated.active);

        let missing = ApiTokenUpdateCmd {
            token_id: Id::new(),
            ..Default::default()
        };
        assert!(matches!(
            service.update(&owner, missing).await,
            Err(OvooError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_token_cannot_be_activated() {
        let (_db, store, service, owner) = setup().await;
        let mut token = ApiToken::new("old", "", owner.id.clone(), 1);
        token.expires_at = Utc::now() - Duration::hours(1);
        token.active = false;
        store.create_api_token(&token).await.unwrap();

        let cmd = ApiTokenUpdateCmd {
            token_id: token.id.clone(),
            active: Some(true),
            ..Default::default()
        };
        assert!(matches!(
            service.update(&owner, cmd).await,
            Err(OvooError::Validation(_))
        ));

        let rename = ApiTokenUpdateCmd {
            token_id: token.id.clone(),
            name: Some("expired".to_string()),
            ..Default::default()
        };
        assert_eq!(service.update(&owner, rename).await.unwrap().name, "expired");
    }

    #[tokio::test]
    async fn test_delete_token() {
        let (_db, store, service, owner) = setup().await;
        let token = service.create(&owner, cmd("cli", 1)).await.unwrap();
        service.delete(&owner, &token.id).await.unwrap();
        assert!(store
            .get_api_token_by_id(&token.id)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(service
            .delete(&owner, &token.id)
            .await
            .unwrap_err()
            .is_not_found());
    }
}
