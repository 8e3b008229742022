//! Authorization and credentials.
//!
//! `permission` holds the role/action/resource capability table consulted by
//! every service; `password` hashes local account passwords.

mod password;
pub mod permission;

pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH,
};
pub use permission::{is_permitted, permits, require, Action, Ownership, Resource};
