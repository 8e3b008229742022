//! Chain queries.
//!
//! Chains are stored as four address ids; reads resolve them into full
//! address snapshots.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use super::address;
use super::query::{delete_in, Conditions};
use crate::entities::{Chain, ChainFilter, Hash, Id};
use crate::{OvooError, Result};

const COLUMNS: &str =
    "hash, from_address_id, to_address_id, orig_from_address_id, orig_to_address_id, created_at";

#[derive(Debug, FromRow)]
struct ChainRow {
    hash: String,
    from_address_id: String,
    to_address_id: String,
    orig_from_address_id: String,
    orig_to_address_id: String,
    created_at: DateTime<Utc>,
}

async fn resolve(conn: &mut SqliteConnection, row: ChainRow) -> Result<Chain> {
    Ok(Chain {
        hash: Hash::from(row.hash),
        from_address: address::get_by_id(conn, &Id::from(row.from_address_id)).await?,
        to_address: address::get_by_id(conn, &Id::from(row.to_address_id)).await?,
        orig_from_address: address::get_by_id(conn, &Id::from(row.orig_from_address_id)).await?,
        orig_to_address: address::get_by_id(conn, &Id::from(row.orig_to_address_id)).await?,
        created_at: row.created_at,
    })
}

pub(crate) async fn create(conn: &mut SqliteConnection, chain: &Chain) -> Result<()> {
    batch_create(conn, std::slice::from_ref(chain)).await
}

pub(crate) async fn batch_create(conn: &mut SqliteConnection, chains: &[Chain]) -> Result<()> {
    if chains.is_empty() {
        return Ok(());
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("INSERT INTO chains ({COLUMNS}) "));
    qb.push_values(chains, |mut b, c| {
        b.push_bind(c.hash.to_string())
            .push_bind(c.from_address.id.to_string())
            .push_bind(c.to_address.id.to_string())
            .push_bind(c.orig_from_address.id.to_string())
            .push_bind(c.orig_to_address.id.to_string())
            .push_bind(c.created_at);
    });
    qb.build().execute(&mut *conn).await?;
    Ok(())
}

pub(crate) async fn get_by_hash(conn: &mut SqliteConnection, hash: &Hash) -> Result<Chain> {
    let row = sqlx::query_as::<_, ChainRow>(&format!(
        "SELECT {COLUMNS} FROM chains WHERE hash = ?"
    ))
    .bind(hash.as_str())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| OvooError::NotFound("chain".to_string()))?;

    resolve(conn, row).await
}

pub(crate) async fn get_by_filter(
    conn: &mut SqliteConnection,
    filter: &ChainFilter,
) -> Result<(Vec<Chain>, i64)> {
    let conditions = Conditions::new()
        .any_of("orig_from_address_id", &filter.orig_from_address_ids)
        .any_of("orig_to_address_id", &filter.orig_to_address_ids)
        .any_of("from_address_id", &filter.from_address_ids)
        .any_of("to_address_id", &filter.to_address_ids);

    let count = conditions
        .count_query("chains")
        .build_query_scalar::<i64>()
        .fetch_one(&mut *conn)
        .await?;

    let rows = conditions
        .select_query(COLUMNS, "chains", "created_at, hash", &filter.filter)
        .build_query_as::<ChainRow>()
        .fetch_all(&mut *conn)
        .await?;

    let mut chains = Vec::with_capacity(rows.len());
    for row in rows {
        chains.push(resolve(conn, row).await?);
    }
    Ok((chains, count))
}

pub(crate) async fn delete(conn: &mut SqliteConnection, hash: &Hash) -> Result<()> {
    let result = sqlx::query("DELETE FROM chains WHERE hash = ?")
        .bind(hash.as_str())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(OvooError::NotFound("chain".to_string()));
    }
    Ok(())
}

pub(crate) async fn batch_delete(conn: &mut SqliteConnection, hashes: &[Hash]) -> Result<()> {
    if let Some(mut qb) = delete_in("chains", "hash", hashes) {
        qb.build().execute(&mut *conn).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::entities::{Address, AddressKind, Email};

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    /// Persist the four addresses of a forward chain and return the chain.
    async fn forward_chain(conn: &mut SqliteConnection) -> Chain {
        let owner = Id::new();
        let protected =
            Address::new(AddressKind::Protected, Email::from("p@x.org"), owner.clone());
        let external =
            Address::new(AddressKind::External, Email::from("ext@y.com"), owner.clone());
        let alias = Address::new(AddressKind::Alias, Email::from("a@x.org"), owner.clone())
            .with_forward_address(protected.id.clone());
        let reply = Address::new(AddressKind::ReplyAlias, Email::from("r@x.org"), owner)
            .with_forward_address(external.id.clone());
        address::batch_create(
            conn,
            &[protected.clone(), external.clone(), alias.clone(), reply.clone()],
        )
        .await
        .unwrap();

        Chain::new(reply, protected, external, alias)
    }

    #[tokio::test]
    async fn test_create_and_get_resolves_addresses() {
        let db = setup_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let chain = forward_chain(&mut conn).await;
        create(&mut conn, &chain).await.unwrap();

        let fetched = get_by_hash(&mut conn, &chain.hash).await.unwrap();
        assert_eq!(fetched.hash, chain.hash);
        assert_eq!(fetched.from_address.email.as_str(), "r@x.org");
        assert_eq!(fetched.to_address.email.as_str(), "p@x.org");
        assert_eq!(fetched.orig_from_address.kind, AddressKind::External);
        assert_eq!(fetched.orig_to_address.kind, AddressKind::Alias);
    }

    #[tokio::test]
    async fn test_duplicate_hash() {
        let db = setup_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let chain = forward_chain(&mut conn).await;
        create(&mut conn, &chain).await.unwrap();
        assert!(create(&mut conn, &chain).await.unwrap_err().is_duplicate());
    }

    #[tokio::test]
    async fn test_filter_and_delete() {
        let db = setup_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let chain = forward_chain(&mut conn).await;
        create(&mut conn, &chain).await.unwrap();

        let filter = ChainFilter {
            orig_to_address_ids: vec![chain.orig_to_address.id.clone()],
            ..ChainFilter::default()
        };
        let (found, count) = get_by_filter(&mut conn, &filter).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(found[0].hash, chain.hash);

        let filter = ChainFilter {
            from_address_ids: vec![chain.orig_to_address.id.clone()],
            ..ChainFilter::default()
        };
        assert_eq!(get_by_filter(&mut conn, &filter).await.unwrap().1, 0);

        batch_delete(&mut conn, &[chain.hash.clone()]).await.unwrap();
        assert!(get_by_hash(&mut conn, &chain.hash).await.unwrap_err().is_not_found());
        assert!(delete(&mut conn, &chain.hash).await.unwrap_err().is_not_found());
    }
}
