//! API token queries.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};

use super::query::Conditions;
use crate::entities::{ApiToken, ApiTokenFilter, Id};
use crate::{OvooError, Result};

const COLUMNS: &str = "id, name, description, token, owner_id, expires_at, active, created_at";

#[derive(Debug, FromRow)]
struct ApiTokenRow {
    id: String,
    name: String,
    description: String,
    token: String,
    owner_id: String,
    expires_at: DateTime<Utc>,
    active: bool,
    created_at: DateTime<Utc>,
}

impl From<ApiTokenRow> for ApiToken {
    fn from(row: ApiTokenRow) -> Self {
        ApiToken {
            id: Id::from(row.id),
            name: row.name,
            description: row.description,
            token: row.token,
            owner: Id::from(row.owner_id),
            expires_at: row.expires_at,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

pub(crate) async fn create(conn: &mut SqliteConnection, token: &ApiToken) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO api_tokens ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(token.id.as_str())
    .bind(&token.name)
    .bind(&token.description)
    .bind(&token.token)
    .bind(token.owner.as_str())
    .bind(token.expires_at)
    .bind(token.active)
    .bind(token.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) async fn get_by_id(conn: &mut SqliteConnection, id: &Id) -> Result<ApiToken> {
    let row = sqlx::query_as::<_, ApiTokenRow>(&format!(
        "SELECT {COLUMNS} FROM api_tokens WHERE id = ?"
    ))
    .bind(id.as_str())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| OvooError::NotFound("api token".to_string()))?;

    Ok(row.into())
}

pub(crate) async fn get_for_user(
    conn: &mut SqliteConnection,
    owner: &Id,
    filter: &ApiTokenFilter,
) -> Result<(Vec<ApiToken>, i64)> {
    let conditions = Conditions::new()
        .any_of("owner_id", [owner])
        .any_of("id", &filter.filter.ids);

    let count = conditions
        .count_query("api_tokens")
        .build_query_scalar::<i64>()
        .fetch_one(&mut *conn)
        .await?;

    let rows = conditions
        .select_query(COLUMNS, "api_tokens", "created_at, id", &filter.filter)
        .build_query_as::<ApiTokenRow>()
        .fetch_all(&mut *conn)
        .await?;

    Ok((rows.into_iter().map(ApiToken::from).collect(), count))
}

pub(crate) async fn update(conn: &mut SqliteConnection, token: &ApiToken) -> Result<()> {
    let result =
        sqlx::query("UPDATE api_tokens SET name = ?, description = ?, active = ? WHERE id = ?")
            .bind(&token.name)
            .bind(&token.description)
            .bind(token.active)
            .bind(token.id.as_str())
            .execute(&mut *conn)
            .await?;

    if result.rows_affected() == 0 {
        return Err(OvooError::NotFound("api token".to_string()));
    }
    Ok(())
}

pub(crate) async fn delete(conn: &mut SqliteConnection, id: &Id) -> Result<()> {
    let result = sqlx::query("DELETE FROM api_tokens WHERE id = ?")
        .bind(id.as_str())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(OvooError::NotFound("api token".to_string()));
    }
    Ok(())
}
