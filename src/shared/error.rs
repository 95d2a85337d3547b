//! Shared Error Types
//!
//! This module defines error types that are shared between the server and
//! its clients. These errors represent failures detected while decoding or
//! validating wire data, before any storage is touched.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - Data validation failures on a named field
//! - `BadOperation` - A pushed operation does not carry exactly one payload
//!
//! # Usage
//!
//! ```rust
//! use splitsync::shared::error::SharedError;
//!
//! let error = SharedError::bad_operation("matches to multiple operations");
//! ```
use thiserror::Error;

/// Shared error types that can occur while handling wire data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Structurally invalid operation
    #[error("Bad operation: {message}")]
    BadOperation {
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new bad operation error
    pub fn bad_operation(message: impl Into<String>) -> Self {
        Self::BadOperation {
            message: message.into(),
        }
    }
}

/// Helper trait for converting serialization errors
impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
