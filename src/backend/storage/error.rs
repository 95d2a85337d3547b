/**
 * Store Errors
 *
 * Errors returned by the repositories. The type is `Clone` so a unit of work
 * whose snapshot query failed can hand the same error to both `perform` and
 * `rollback`.
 */
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Operation id already present in the log
    #[error("operation {operation_id} already exists")]
    Conflict { operation_id: Uuid },

    /// Unique column already taken (username, email)
    #[error("{field} is already taken")]
    Duplicate { field: String },

    /// Stored bytes could not be decoded back into an operation
    #[error("stored operation {operation_id} is corrupt: {message}")]
    Corrupt { operation_id: Uuid, message: String },

    /// Connection, constraint or serialization failure
    #[error("database error: {message}")]
    Database { message: String },
}

impl StoreError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Duplicate { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::database(format!("migration failed: {}", err))
    }
}

/// Whether a driver error is a unique-constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
