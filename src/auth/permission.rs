//! Permission checking for Ovoo.
//!
//! Authorization is a capability table indexed by the actor's role, the
//! action, the resource type and whether the target belongs to the actor.
//! [`permits`] is the table; everything else in this module is a view of it.

use std::fmt;

use crate::entities::{Id, Role, User};
use crate::{OvooError, Result};

/// Operation requested on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::List,
        Action::Get,
        Action::Create,
        Action::Update,
        Action::Delete,
    ];
}

/// Resource type an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Alias,
    ProtectedAddress,
    Chain,
    User,
    ApiToken,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Alias,
        Resource::ProtectedAddress,
        Resource::Chain,
        Resource::User,
        Resource::ApiToken,
    ];
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Alias => "alias",
            Resource::ProtectedAddress => "protected address",
            Resource::Chain => "chain",
            Resource::User => "user",
            Resource::ApiToken => "api token",
        };
        f.write_str(name)
    }
}

/// Relation between the actor and the target of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// The target belongs to the actor (for users: the target is the actor).
    Own,
    /// The target belongs to somebody else.
    Other,
    /// There is no single target yet (list, create).
    Unowned,
}

impl Ownership {
    pub const ALL: [Ownership; 3] = [Ownership::Own, Ownership::Other, Ownership::Unowned];

    /// Relation of `actor` to a target owned by `owner`.
    pub fn of(actor: &User, owner: Option<&Id>) -> Self {
        match owner {
            None => Ownership::Unowned,
            Some(owner) if *owner == actor.id => Ownership::Own,
            Some(_) => Ownership::Other,
        }
    }
}

/// The capability table.
pub fn permits(role: Role, action: Action, resource: Resource, ownership: Ownership) -> bool {
    use Action::*;

    match (role, resource) {
        (Role::Admin, Resource::Alias | Resource::ProtectedAddress | Resource::ApiToken) => true,
        (Role::Admin, Resource::Chain) => action != Update,
        // Admins may not delete their own account.
        (Role::Admin, Resource::User) => !(action == Delete && ownership == Ownership::Own),

        (Role::Regular, Resource::Alias | Resource::ProtectedAddress) => match action {
            List | Create => true,
            Get | Update | Delete => ownership == Ownership::Own,
        },
        (Role::Regular, Resource::Chain) => false,
        (Role::Regular, Resource::User) => {
            matches!(action, Get | Update) && ownership == Ownership::Own
        }

        (Role::Milter, Resource::Chain) => action != Update,
        (Role::Milter, Resource::Alias | Resource::ProtectedAddress | Resource::User) => false,

        (Role::Regular | Role::Milter, Resource::ApiToken) => match action {
            List | Create => true,
            Get | Update | Delete => ownership == Ownership::Own,
        },
    }
}

/// Whether `actor` may perform `action` on a `resource` owned by
/// `target_owner` (`None` for list/create).
pub fn is_permitted(
    actor: &User,
    action: Action,
    resource: Resource,
    target_owner: Option<&Id>,
) -> bool {
    permits(actor.role, action, resource, Ownership::of(actor, target_owner))
}

/// Like [`is_permitted`] but turns a denial into [`OvooError::NotAuthorized`].
///
/// # Examples
///
/// ```
/// use ovoo::auth::permission::{require, Action, Resource};
/// use ovoo::entities::{Role, User};
///
/// let milter = User::new(Role::Milter, "milter");
/// assert!(require(&milter, Action::Create, Resource::Chain, None).is_ok());
/// assert!(require(&milter, Action::Create, Resource::Alias, None).is_err());
/// ```
pub fn require(
    actor: &User,
    action: Action,
    resource: Resource,
    target_owner: Option<&Id>,
) -> Result<()> {
    if is_permitted(actor, action, resource, target_owner) {
        Ok(())
    } else {
        tracing::debug!(
            user = %actor.id,
            role = %actor.role,
            ?action,
            %resource,
            "permission denied"
        );
        Err(OvooError::NotAuthorized)
    }
}

pub fn can_create_alias(actor: &User) -> bool {
    is_permitted(actor, Action::Create, Resource::Alias, None)
}

pub fn can_get_alias(actor: &User, owner: &Id) -> bool {
    is_permitted(actor, Action::Get, Resource::Alias, Some(owner))
}

pub fn can_get_aliases(actor: &User) -> bool {
    is_permitted(actor, Action::List, Resource::Alias, None)
}

pub fn can_update_alias(actor: &User, owner: &Id) -> bool {
    is_permitted(actor, Action::Update, Resource::Alias, Some(owner))
}

pub fn can_delete_alias(actor: &User, owner: &Id) -> bool {
    is_permitted(actor, Action::Delete, Resource::Alias, Some(owner))
}

pub fn can_create_protected_address(actor: &User) -> bool {
    is_permitted(actor, Action::Create, Resource::ProtectedAddress, None)
}

pub fn can_get_protected_address(actor: &User, owner: &Id) -> bool {
    is_permitted(actor, Action::Get, Resource::ProtectedAddress, Some(owner))
}

pub fn can_get_protected_addresses(actor: &User) -> bool {
    is_permitted(actor, Action::List, Resource::ProtectedAddress, None)
}

pub fn can_update_protected_address(actor: &User, owner: &Id) -> bool {
    is_permitted(actor, Action::Update, Resource::ProtectedAddress, Some(owner))
}

pub fn can_delete_protected_address(actor: &User, owner: &Id) -> bool {
    is_permitted(actor, Action::Delete, Resource::ProtectedAddress, Some(owner))
}

pub fn can_create_chain(actor: &User) -> bool {
    is_permitted(actor, Action::Create, Resource::Chain, None)
}

pub fn can_get_chain(actor: &User) -> bool {
    is_permitted(actor, Action::Get, Resource::Chain, None)
}

pub fn can_get_chains(actor: &User) -> bool {
    is_permitted(actor, Action::List, Resource::Chain, None)
}

pub fn can_delete_chain(actor: &User) -> bool {
    is_permitted(actor, Action::Delete, Resource::Chain, None)
}

pub fn can_create_user(actor: &User) -> bool {
    is_permitted(actor, Action::Create, Resource::User, None)
}

pub fn can_get_user(actor: &User, target: &Id) -> bool {
    is_permitted(actor, Action::Get, Resource::User, Some(target))
}

pub fn can_get_users(actor: &User) -> bool {
    is_permitted(actor, Action::List, Resource::User, None)
}

pub fn can_update_user(actor: &User, target: &Id) -> bool {
    is_permitted(actor, Action::Update, Resource::User, Some(target))
}

pub fn can_delete_user(actor: &User, target: &Id) -> bool {
    is_permitted(actor, Action::Delete, Resource::User, Some(target))
}

pub fn can_create_api_token(actor: &User) -> bool {
    is_permitted(actor, Action::Create, Resource::ApiToken, None)
}

pub fn can_get_api_token(actor: &User, owner: &Id) -> bool {
    is_permitted(actor, Action::Get, Resource::ApiToken, Some(owner))
}

pub fn can_update_api_token(actor: &User, owner: &Id) -> bool {
    is_permitted(actor, Action::Update, Resource::ApiToken, Some(owner))
}

pub fn can_delete_api_token(actor: &User, owner: &Id) -> bool {
    is_permitted(actor, Action::Delete, Resource::ApiToken, Some(owner))
}
