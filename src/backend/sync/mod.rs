//! Sync Module
//!
//! The operations sync engine. Clients push local mutations as operations,
//! pull the operations other users pushed about entities they watch, and
//! confirm what they applied.
//!
//! # Architecture
//!
//! - **`fanout`** - Which users must watch which entities after an operation
//! - **`store`** - The operation log (`OperationStore`, Postgres and in-memory)
//! - **`display`** - Names rebuilt from the log, alert formatting
//! - **`controller`** - Push/pull/confirm/search orchestration and notification fan-out
//! - **`handlers`** - HTTP handlers for `/api/operations` and `/api/users/search`
//!
//! # Data Flow
//!
//! ```text
//! client ── push ──> SyncController ──> OperationStore (operations, index, bindings)
//!                          │
//!                          ├──> GetUsers(tracked entities) ──> RealtimeNotifier
//!                          └──> (group / spending) ──> PushSender
//!
//! other device ── pull ──> undelivered operations ── confirm ──> delivered
//! ```

pub mod controller;
pub mod display;
pub mod fanout;
pub mod handlers;
pub mod store;

use thiserror::Error;

use crate::backend::storage::StoreError;
use crate::shared::SharedError;

pub use controller::SyncController;
pub use fanout::{resolve_bind_actions, EntityBindAction};
pub use store::{MemoryOperationStore, OperationRecord, OperationStore, PgOperationStore, PushOperation};

/// Failure of a sync call
#[derive(Debug, Error)]
pub enum SyncError {
    /// Rejected before touching the store
    #[error(transparent)]
    Invalid(#[from] SharedError),

    /// Store failure, with the step that failed
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        source: StoreError,
    },
}

impl SyncError {
    /// Wrap a store error with the step that failed
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { context, source }
    }
}
