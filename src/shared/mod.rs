//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the server and its clients. These types define the JSON bodies of the
//! sync API and the realtime event stream.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code. All types are designed for serialization
//! and transmission over HTTP.

/// Operation log types (payloads, entities, wire bodies)
pub mod operations;

/// Real-time event system
pub mod event;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use event::{RealtimeEvent, EventType};
pub use error::SharedError;
pub use operations::{Operation, OperationPayload, OperationType, TrackedEntity};
