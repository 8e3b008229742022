//! Ovoo - privacy-preserving mail relay.
//!
//! Users register protected (real) addresses and hand out disposable aliases.
//! Mail sent to an alias builds a pair of chains so the protected address
//! receives it from a per-correspondent reply alias, and replies travel back
//! through the alias without either side seeing the other's real address.

pub mod auth;
pub mod config;
pub mod db;
pub mod dictionary;
pub mod entities;
pub mod error;
pub mod logging;
pub mod milter;
pub mod services;

pub use auth::{hash_password, validate_password, verify_password, PasswordError};
pub use config::Config;
pub use db::{Database, SqliteStore};
pub use error::{OvooError, Result};
pub use services::Services;
