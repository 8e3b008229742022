//! Address queries.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use super::query::{delete_in, Conditions};
use crate::entities::{Address, AddressFilter, AddressMetadata, Email, Id};
use crate::{OvooError, Result};

const COLUMNS: &str = "id, kind, email, forward_address_id, owner_id, comment, service_name, \
                       created_at, updated_at, updated_by";

#[derive(Debug, FromRow)]
struct AddressRow {
    id: String,
    kind: String,
    email: String,
    forward_address_id: Option<String>,
    owner_id: String,
    comment: String,
    service_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    updated_by: Option<String>,
}

impl TryFrom<AddressRow> for Address {
    type Error = OvooError;

    fn try_from(row: AddressRow) -> Result<Self> {
        Ok(Address {
            id: Id::from(row.id),
            kind: row.kind.parse()?,
            email: Email::from(row.email),
            forward_address: row.forward_address_id.map(Id::from),
            owner: Id::from(row.owner_id),
            metadata: AddressMetadata {
                comment: row.comment,
                service_name: row.service_name,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
            updated_by: row.updated_by.map(Id::from),
        })
    }
}

fn into_addresses(rows: Vec<AddressRow>) -> Result<Vec<Address>> {
    rows.into_iter().map(Address::try_from).collect()
}

pub(crate) async fn create(conn: &mut SqliteConnection, address: &Address) -> Result<()> {
    batch_create(conn, std::slice::from_ref(address)).await
}

pub(crate) async fn batch_create(
    conn: &mut SqliteConnection,
    addresses: &[Address],
) -> Result<()> {
    if addresses.is_empty() {
        return Ok(());
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("INSERT INTO addresses ({COLUMNS}) "));
    qb.push_values(addresses, |mut b, a| {
        b.push_bind(a.id.to_string())
            .push_bind(a.kind.as_str())
            .push_bind(a.email.to_string())
            .push_bind(a.forward_address.as_ref().map(Id::to_string))
            .push_bind(a.owner.to_string())
            .push_bind(a.metadata.comment.clone())
            .push_bind(a.metadata.service_name.clone())
            .push_bind(a.created_at)
            .push_bind(a.updated_at)
            .push_bind(a.updated_by.as_ref().map(Id::to_string));
    });
    qb.build().execute(&mut *conn).await?;
    Ok(())
}

pub(crate) async fn update(conn: &mut SqliteConnection, address: &Address) -> Result<()> {
    let result = sqlx::query(
        "UPDATE addresses SET comment = ?, service_name = ?, updated_at = ?, updated_by = ?
         WHERE id = ?",
    )
    .bind(&address.metadata.comment)
    .bind(&address.metadata.service_name)
    .bind(address.updated_at)
    .bind(address.updated_by.as_ref().map(Id::as_str))
    .bind(address.id.as_str())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(OvooError::NotFound("address".to_string()));
    }
    Ok(())
}

pub(crate) async fn delete(conn: &mut SqliteConnection, id: &Id) -> Result<()> {
    let result = sqlx::query("DELETE FROM addresses WHERE id = ?")
        .bind(id.as_str())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(OvooError::NotFound("address".to_string()));
    }
    Ok(())
}

pub(crate) async fn batch_delete(conn: &mut SqliteConnection, ids: &[Id]) -> Result<()> {
    if let Some(mut qb) = delete_in("addresses", "id", ids) {
        qb.build().execute(&mut *conn).await?;
    }
    Ok(())
}

pub(crate) async fn get_by_id(conn: &mut SqliteConnection, id: &Id) -> Result<Address> {
    let row = sqlx::query_as::<_, AddressRow>(&format!(
        "SELECT {COLUMNS} FROM addresses WHERE id = ?"
    ))
    .bind(id.as_str())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| OvooError::NotFound("address".to_string()))?;

    Address::try_from(row)
}

pub(crate) async fn get_by_email(
    conn: &mut SqliteConnection,
    email: &Email,
) -> Result<Vec<Address>> {
    let rows = sqlx::query_as::<_, AddressRow>(&format!(
        "SELECT {COLUMNS} FROM addresses WHERE email = ? ORDER BY id"
    ))
    .bind(email.as_str())
    .fetch_all(&mut *conn)
    .await?;

    into_addresses(rows)
}

pub(crate) async fn get_all(
    conn: &mut SqliteConnection,
    filter: &AddressFilter,
) -> Result<(Vec<Address>, i64)> {
    let conditions = Conditions::new()
        .any_of("id", &filter.filter.ids)
        .any_of("kind", filter.kinds.iter().map(|k| k.as_str()))
        .any_of("email", &filter.emails)
        .any_of("owner_id", &filter.owners)
        .any_of("service_name", &filter.service_names)
        .any_of("forward_address_id", &filter.forward_address_ids);

    let count = conditions
        .count_query("addresses")
        .build_query_scalar::<i64>()
        .fetch_one(&mut *conn)
        .await?;

    let rows = conditions
        .select_query(COLUMNS, "addresses", "id", &filter.filter)
        .build_query_as::<AddressRow>()
        .fetch_all(&mut *conn)
        .await?;

    Ok((into_addresses(rows)?, count))
}
