//! Cascading deletion over the address/chain graph.
//!
//! Deleting a node removes everything that depends on it, in the order the
//! foreign keys require: chains first, then reply aliases and aliases, then
//! protected addresses. These functions issue plain store calls; callers that
//! need atomicity pass a transaction.

use tracing::debug;

use crate::db::Store;
use crate::entities::{Address, AddressFilter, AddressKind, ChainFilter, Hash, Id};
use crate::Result;

/// Delete every protected address owned by `user_id`, with its aliases.
pub async fn delete_protected_addresses_for_user<S: Store + ?Sized>(
    store: &S,
    user_id: &Id,
) -> Result<()> {
    let filter = AddressFilter::of_kind(AddressKind::Protected).with_owner(user_id.clone());
    let (protected, _) = store.get_all_addresses(&filter).await?;
    if protected.is_empty() {
        return Ok(());
    }

    for address in &protected {
        delete_aliases_for_protected_address(store, address).await?;
    }

    let ids: Vec<Id> = protected.into_iter().map(|a| a.id).collect();
    debug!(user = %user_id, count = ids.len(), "deleting protected addresses");
    store.batch_delete_addresses(&ids).await
}

/// Delete every alias forwarding to `protected`, with their chains,
/// whoever owns them.
pub async fn delete_aliases_for_protected_address<S: Store + ?Sized>(
    store: &S,
    protected: &Address,
) -> Result<()> {
    let filter =
        AddressFilter::of_kind(AddressKind::Alias).with_forward_address(protected.id.clone());
    let (aliases, _) = store.get_all_addresses(&filter).await?;
    if aliases.is_empty() {
        return Ok(());
    }

    let ids: Vec<Id> = aliases.into_iter().map(|a| a.id).collect();
    delete_alias_ids(store, &ids).await
}

/// Delete the given aliases and their chains.
pub async fn delete_alias_ids<S: Store + ?Sized>(store: &S, ids: &[Id]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    delete_chains_for_alias_ids(store, ids).await?;
    debug!(count = ids.len(), "deleting aliases");
    store.batch_delete_addresses(ids).await
}

/// Delete both directions of every chain built on the given aliases, and the
/// reply aliases minted for them.
pub async fn delete_chains_for_alias_ids<S: Store + ?Sized>(store: &S, ids: &[Id]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    // Forward chains: mail sent to one of the aliases.
    let forward_filter = ChainFilter {
        orig_to_address_ids: ids.to_vec(),
        ..ChainFilter::default()
    };
    let (forward, _) = store.get_chains_by_filter(&forward_filter).await?;

    // Reverse chains: replies leaving through one of the aliases.
    let reverse_filter = ChainFilter {
        from_address_ids: ids.to_vec(),
        ..ChainFilter::default()
    };
    let (reverse, _) = store.get_chains_by_filter(&reverse_filter).await?;

    let reply_alias_ids: Vec<Id> = forward
        .iter()
        .filter(|c| c.from_address.kind == AddressKind::ReplyAlias)
        .map(|c| c.from_address.id.clone())
        .collect();

    let mut hashes: Vec<Hash> = forward
        .into_iter()
        .chain(reverse)
        .map(|c| c.hash)
        .collect();
    hashes.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    hashes.dedup();

    debug!(
        chains = hashes.len(),
        reply_aliases = reply_alias_ids.len(),
        "deleting chains for aliases"
    );
    store.batch_delete_chains(&hashes).await?;
    store.batch_delete_addresses(&reply_alias_ids).await
}
