//! Lead store error types.

use thiserror::Error;

use crate::import::ImportError;
use crate::validation::ValidationError;

/// Errors that can occur during lead store operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A lead with the same email or phone already exists.
    #[error("duplicate lead: email {email:?} or phone {phone:?} already exists")]
    Duplicate { email: String, phone: String },

    /// Candidate or edit failed field validation.
    #[error("invalid lead: {0}")]
    Validation(#[from] ValidationError),

    /// Uploaded import file could not be read.
    #[error("import failed: {0}")]
    Import(#[from] ImportError),
}

impl DatabaseError {
    pub(crate) fn lead_not_found(id: i64) -> Self {
        DatabaseError::NotFound {
            entity: "Lead",
            id: id.to_string(),
        }
    }
}

/// Result type for lead store operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
