//! User queries.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};

use super::query::Conditions;
use crate::entities::{Id, User, UserFilter};
use crate::{OvooError, Result};

const COLUMNS: &str =
    "id, role, login, first_name, last_name, password_hash, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    role: String,
    login: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = OvooError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: Id::from(row.id),
            role: row.role.parse()?,
            login: row.login,
            first_name: row.first_name,
            last_name: row.last_name,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) async fn create(conn: &mut SqliteConnection, user: &User) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO users ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(user.id.as_str())
    .bind(user.role.as_str())
    .bind(&user.login)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.password_hash)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn fetch_one_by(conn: &mut SqliteConnection, column: &str, value: &str) -> Result<User> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {COLUMNS} FROM users WHERE {column} = ?"
    ))
    .bind(value)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| OvooError::NotFound("user".to_string()))?;

    User::try_from(row)
}

pub(crate) async fn get_by_id(conn: &mut SqliteConnection, id: &Id) -> Result<User> {
    fetch_one_by(conn, "id", id.as_str()).await
}

pub(crate) async fn get_by_login(conn: &mut SqliteConnection, login: &str) -> Result<User> {
    fetch_one_by(conn, "login", login).await
}

pub(crate) async fn get_all(
    conn: &mut SqliteConnection,
    filter: &UserFilter,
) -> Result<(Vec<User>, i64)> {
    let conditions = Conditions::new()
        .any_of("id", &filter.filter.ids)
        .any_of("role", filter.kinds.iter().map(|r| r.as_str()))
        .any_of("login", &filter.logins);

    let count = conditions
        .count_query("users")
        .build_query_scalar::<i64>()
        .fetch_one(&mut *conn)
        .await?;

    let rows = conditions
        .select_query(COLUMNS, "users", "login", &filter.filter)
        .build_query_as::<UserRow>()
        .fetch_all(&mut *conn)
        .await?;

    let users = rows
        .into_iter()
        .map(User::try_from)
        .collect::<Result<Vec<_>>>()?;
    Ok((users, count))
}

pub(crate) async fn update(conn: &mut SqliteConnection, user: &User) -> Result<()> {
    let result = sqlx::query(
        "UPDATE users SET role = ?, first_name = ?, last_name = ?, password_hash = ?,
                updated_at = ?
         WHERE id = ?",
    )
    .bind(user.role.as_str())
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.password_hash)
    .bind(user.updated_at)
    .bind(user.id.as_str())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(OvooError::NotFound("user".to_string()));
    }
    Ok(())
}

pub(crate) async fn delete(conn: &mut SqliteConnection, id: &Id) -> Result<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id.as_str())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(OvooError::NotFound("user".to_string()));
    }
    Ok(())
}
