//! Error types for Ovoo.

use thiserror::Error;

/// Common error type for Ovoo.
///
/// Every public operation returns exactly one of these kinds. Persistence
/// failures are mapped onto them by the store adapter and travel up through
/// the service layer unchanged.
#[derive(Error, Debug)]
pub enum OvooError {
    /// Malformed input or a business-rule violation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// A record with the same unique key already exists.
    #[error("duplicate entry: {0}")]
    DuplicateEntry(String),

    /// The acting user may not perform the requested operation.
    #[error("requested operation is not authorized for the user")]
    NotAuthorized,

    /// Invalid startup configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Opaque backend failure that is not a database error.
    #[error("general backend error: {0}")]
    General(String),

    /// Database error.
    ///
    /// Database errors from sqlx are converted automatically; "row not found"
    /// and unique violations are mapped to [`OvooError::NotFound`] and
    /// [`OvooError::DuplicateEntry`] instead.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OvooError {
    /// Check whether this error means the record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, OvooError::NotFound(_))
    }

    /// Check whether this error is a unique-key conflict.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, OvooError::DuplicateEntry(_))
    }
}

impl From<sqlx::Error> for OvooError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => OvooError::NotFound("record".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                OvooError::DuplicateEntry(db_err.message().to_string())
            }
            _ => OvooError::Database(e.to_string()),
        }
    }
}

/// Result type alias for Ovoo operations.
pub type Result<T> = std::result::Result<T, OvooError>;
