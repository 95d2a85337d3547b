/**
 * Unit of Work
 *
 * A write split into `perform` and its compensating `rollback`. Both halves
 * branch off state captured when the unit was built, never off state
 * re-read after a partial failure.
 */
use async_trait::async_trait;

use crate::backend::storage::error::StoreError;

#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Apply the write
    async fn perform(&self) -> Result<(), StoreError>;

    /// Undo what `perform` applied. A no-op if `perform` never succeeded.
    async fn rollback(&self) -> Result<(), StoreError>;
}

/// Unit whose preparation failed. Both halves report the preparation error.
#[derive(Debug, Clone)]
pub struct FailedUnit {
    error: StoreError,
}

impl FailedUnit {
    pub fn new(error: StoreError) -> Self {
        Self { error }
    }

    pub fn boxed(error: StoreError) -> Box<dyn UnitOfWork> {
        Box::new(Self::new(error))
    }
}

#[async_trait]
impl UnitOfWork for FailedUnit {
    async fn perform(&self) -> Result<(), StoreError> {
        Err(self.error.clone())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        Err(self.error.clone())
    }
}
