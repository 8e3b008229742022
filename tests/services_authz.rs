//! Role and ownership checks as seen through the services.

mod common;

use common::TestRelay;
use ovoo::entities::{AddressFilter, Email, Role, UserFilter};
use ovoo::services::{all_owners, AliasUpdateCmd, MetadataCmd, UserUpdateCmd};
use ovoo::OvooError;

/// Regular users only ever list their own addresses. Admins opt into
/// everyone's with the "all" owner.
#[tokio::test]
async fn test_address_listing_scoped_to_owner() {
    let relay = TestRelay::new().await;
    let bob = relay.add_user("bob").await;
    let alice_protected = relay.protect(&relay.user, "alice@mail.com").await;
    let bob_protected = relay.protect(&bob, "bob@mail.com").await;
    relay.alias_for(&relay.user, &alice_protected).await;
    relay.alias_for(&bob, &bob_protected).await;
    relay.alias_for(&bob, &bob_protected).await;

    // Asking for someone else's addresses still yields only your own.
    let filter = AddressFilter::default().with_owner(bob.id.clone());
    let (aliases, _) = relay
        .services
        .aliases
        .get_all(&relay.user, filter)
        .await
        .unwrap();
    assert_eq!(aliases.len(), 1);
    assert!(aliases.iter().all(|a| a.owner == relay.user.id));

    let (aliases, _) = relay
        .services
        .aliases
        .get_all(&relay.admin, AddressFilter::default())
        .await
        .unwrap();
    assert!(aliases.is_empty());

    let everyone = AddressFilter::default().with_owner(all_owners());
    let (aliases, _) = relay
        .services
        .aliases
        .get_all(&relay.admin, everyone.clone())
        .await
        .unwrap();
    assert_eq!(aliases.len(), 3);

    let (protected, _) = relay
        .services
        .protected_addresses
        .get_all(&relay.admin, everyone)
        .await
        .unwrap();
    assert_eq!(protected.len(), 2);
}

/// Reads and updates of another user's addresses are refused.
#[tokio::test]
async fn test_foreign_address_access_denied() {
    let relay = TestRelay::new().await;
    let bob = relay.add_user("bob").await;
    let protected = relay.protect(&relay.user, "alice@mail.com").await;
    let alias = relay.alias_for(&relay.user, &protected).await;

    let result = relay.services.aliases.get_by_id(&bob, &alias.id).await;
    assert!(matches!(result, Err(OvooError::NotAuthorized)));

    let result = relay
        .services
        .protected_addresses
        .get_by_email(&bob, &Email::from("alice@mail.com"))
        .await;
    assert!(matches!(result, Err(OvooError::NotAuthorized)));

    let result = relay
        .services
        .aliases
        .update(
            &bob,
            AliasUpdateCmd {
                alias_id: alias.id.clone(),
                metadata: MetadataCmd {
                    comment: Some("mine now".to_string()),
                    service_name: None,
                },
            },
        )
        .await;
    assert!(matches!(result, Err(OvooError::NotAuthorized)));

    // The admin may read it.
    let fetched = relay
        .services
        .aliases
        .get_by_id(&relay.admin, &alias.id)
        .await
        .unwrap();
    assert_eq!(fetched.email, alias.email);
}

/// The milter account can create chains but can not manage addresses or users.
#[tokio::test]
async fn test_milter_limited_to_chains() {
    let relay = TestRelay::new().await;

    let result = relay
        .services
        .protected_addresses
        .create(
            &relay.milter,
            ovoo::services::ProtectedAddressCreateCmd {
                email: Email::from("m@mail.com"),
                metadata: MetadataCmd::default(),
            },
        )
        .await;
    assert!(matches!(result, Err(OvooError::NotAuthorized)));

    let result = relay
        .services
        .users
        .get_all(&relay.milter, &UserFilter::default())
        .await;
    assert!(matches!(result, Err(OvooError::NotAuthorized)));
}

/// Only admins list users or change roles.
#[tokio::test]
async fn test_user_management() {
    let relay = TestRelay::new().await;

    let (users, _) = relay
        .services
        .users
        .get_all(&relay.admin, &UserFilter::default())
        .await
        .unwrap();
    assert_eq!(users.len(), 3);

    let result = relay
        .services
        .users
        .get_all(&relay.user, &UserFilter::default())
        .await;
    assert!(matches!(result, Err(OvooError::NotAuthorized)));

    let escalate = UserUpdateCmd {
        user_id: relay.user.id.clone(),
        role: Some(Role::Admin),
        ..Default::default()
    };
    let result = relay.services.users.update(&relay.user, escalate.clone()).await;
    assert!(matches!(result, Err(OvooError::NotAuthorized)));

    let promoted = relay
        .services
        .users
        .update(&relay.admin, escalate)
        .await
        .unwrap();
    assert_eq!(promoted.role, Role::Admin);
}

/// Password checks go through the stored hash.
#[tokio::test]
async fn test_authenticate() {
    let relay = TestRelay::new().await;

    let user = relay
        .services
        .users
        .authenticate("alice", "alice-password")
        .await
        .unwrap();
    assert_eq!(user.id, relay.user.id);

    for (login, password) in [
        ("alice", "wrong-password"),
        ("nobody", "alice-password"),
        ("milter", ""),
    ] {
        let result = relay.services.users.authenticate(login, password).await;
        assert!(
            matches!(result, Err(OvooError::NotAuthorized)),
            "{login} should not authenticate"
        );
    }
}
