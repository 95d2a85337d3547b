//! Storage Module
//!
//! Building blocks shared by every repository in the backend:
//!
//! - **`error`** - `StoreError`, the error type of all repositories
//! - **`unit_of_work`** - Perform/rollback pairs used for compensation
//! - **`factory`** - Builds the configured repository set (Postgres or in-memory)
//!
//! # Compensation
//!
//! Writes are returned as [`UnitOfWork`] values instead of being executed
//! immediately. `perform` applies the write; `rollback` undoes exactly what
//! `perform` applied. Rollback is a compensating action invoked by the caller
//! when a later, unrelated step of a multi-repository workflow fails (for
//! example: credentials stored, but the user's `CreateUser` operation could
//! not be appended). It is not a database transaction rollback; each
//! `perform` commits its own transaction.

/// Repository error type
pub mod error;

/// Compensating unit of work
pub mod unit_of_work;

/// Repository factory keyed by configuration
pub mod factory;

pub use error::StoreError;
pub use factory::{build_repositories, Repositories};
pub use unit_of_work::{FailedUnit, UnitOfWork};
