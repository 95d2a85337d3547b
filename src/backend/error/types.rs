/**
 * Backend Error Types
 *
 * Errors returned by HTTP handlers. Every variant maps to one status code,
 * so store errors keep enough structure (conflict vs. internal) for the
 * conversion layer to pick the right one.
 *
 * # Status Mapping
 *
 * - Bad operation, validation failure - 400
 * - Missing or invalid session - 401
 * - Operation id or username/email already taken - 409
 * - Database, corrupt row, serialization - 500
 */
use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::storage::StoreError;
use crate::backend::sync::SyncError;
use crate::shared::SharedError;

/// Backend-specific error types
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error with an explicit status (e.g. invalid request body)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Missing, malformed or expired session
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Repository failure outside the sync engine (users, devices)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Sync engine failure
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::SharedError(err) => shared_status(err),
            Self::Store(err) => store_status(err),
            Self::Sync(SyncError::Invalid(err)) => shared_status(err),
            Self::Sync(SyncError::Store { source, .. }) => store_status(source),
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client. Internal failures are not described.
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::Unauthorized { message } => message.clone(),
            _ if self.status_code().is_server_error() => "Internal server error".to_string(),
            Self::SharedError(err) => err.to_string(),
            Self::Store(err) => err.to_string(),
            Self::Sync(SyncError::Invalid(err)) => err.to_string(),
            Self::Sync(SyncError::Store { source, .. }) => source.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }
}

fn shared_status(err: &SharedError) -> StatusCode {
    match err {
        SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
        SharedError::BadOperation { .. } => StatusCode::BAD_REQUEST,
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::Conflict { .. } | StoreError::Duplicate { .. } => StatusCode::CONFLICT,
        StoreError::Corrupt { .. } | StoreError::Database { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
