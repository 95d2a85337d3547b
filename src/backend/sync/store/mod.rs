//! Operation Store
//!
//! The transactional core of the sync engine. The store persists operations,
//! indexes them by the entities they concern, materializes watcher bindings
//! and tracks per-(user, device) confirmations.
//!
//! Two implementations share one contract:
//!
//! - **`postgres`** - `PgOperationStore`, four tables inside one SQL transaction per push
//! - **`memory`** - `MemoryOperationStore`, the same tables as hash sets behind a `RwLock`
//!
//! # Visibility
//!
//! An operation is pullable by a device when one of its tracked entities is
//! tracked by the device's user, it travels on the requested channel and no
//! confirmation row exists for that device.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::sync::fanout::{resolve_bind_actions, EntityBindAction};
use crate::shared::operations::{
    Operation, OperationPayload, OperationPayloadType, OperationType, TrackedEntity,
};

pub use crate::backend::storage::{StoreError, UnitOfWork};
pub use memory::MemoryOperationStore;
pub use postgres::PgOperationStore;

/// An operation bundled with the bindings it creates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOperation {
    pub operation: Operation,
    pub bind_actions: Vec<EntityBindAction>,
}

impl PushOperation {
    pub fn new(operation: Operation, bind_actions: Vec<EntityBindAction>) -> Self {
        Self {
            operation,
            bind_actions,
        }
    }

    /// Bundle an operation with the bindings the resolver computes for it
    pub fn resolve(operation: Operation) -> Self {
        let bind_actions = resolve_bind_actions(&operation);
        Self::new(operation, bind_actions)
    }
}

/// Operation row as stored. `data` holds the payload bytes verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    pub operation_id: Uuid,
    pub created_at: i64,
    pub author_id: Uuid,
    pub payload_type: OperationPayloadType,
    pub is_large: bool,
    pub data: Vec<u8>,
    pub search_hint: Option<String>,
}

impl OperationRecord {
    /// Serialize an operation into its row form
    pub fn from_operation(operation: &Operation) -> Result<Self, StoreError> {
        let data = operation.payload.data().map_err(|e| StoreError::Corrupt {
            operation_id: operation.operation_id,
            message: e.to_string(),
        })?;

        Ok(Self {
            operation_id: operation.operation_id,
            created_at: operation.created_at,
            author_id: operation.author_id,
            payload_type: operation.payload.payload_type(),
            is_large: operation.is_large(),
            data,
            search_hint: operation.search_hint().map(str::to_string),
        })
    }

    /// Rebuild the typed operation from the stored bytes
    pub fn decode(&self) -> Result<Operation, StoreError> {
        let payload = OperationPayload::from_data(&self.data).map_err(|e| StoreError::Corrupt {
            operation_id: self.operation_id,
            message: e.to_string(),
        })?;

        if payload.payload_type() != self.payload_type {
            return Err(StoreError::Corrupt {
                operation_id: self.operation_id,
                message: format!(
                    "stored as {} but data decodes to {}",
                    self.payload_type,
                    payload.payload_type()
                ),
            });
        }

        Ok(Operation::new(
            self.operation_id,
            self.created_at,
            self.author_id,
            payload,
        ))
    }

    /// Order used by every read path
    pub(crate) fn sort_key(&self) -> (i64, Uuid) {
        (self.created_at, self.operation_id)
    }
}

/// Decode a batch of records, failing on the first corrupt one
pub fn decode_all(records: &[OperationRecord]) -> Result<Vec<Operation>, StoreError> {
    records.iter().map(OperationRecord::decode).collect()
}

#[async_trait]
pub trait OperationStore: Send + Sync {
    /// Append a batch. The whole batch persists or none of it does.
    fn push(
        &self,
        operations: Vec<PushOperation>,
        user_id: Uuid,
        device_id: &str,
        confirm_origin_device: bool,
    ) -> Box<dyn UnitOfWork>;

    /// Undelivered operations on one channel for one device
    async fn pull(
        &self,
        user_id: Uuid,
        device_id: &str,
        operation_type: OperationType,
    ) -> Result<Vec<OperationRecord>, StoreError>;

    /// Mark operations delivered to one device. The not-yet-confirmed
    /// snapshot is taken here, before the unit is returned.
    async fn confirm(
        &self,
        operation_ids: &[Uuid],
        user_id: Uuid,
        device_id: &str,
    ) -> Box<dyn UnitOfWork>;

    /// Distinct users tracking any of the entities
    async fn get_users(&self, entities: &[TrackedEntity]) -> Result<Vec<Uuid>, StoreError>;

    /// Every operation about any of the entities, confirmed or not
    async fn get(&self, entities: &[TrackedEntity]) -> Result<Vec<OperationRecord>, StoreError>;

    /// Operations of one payload kind whose search hint contains `hint`
    async fn search(
        &self,
        payload_type: OperationPayloadType,
        hint: &str,
    ) -> Result<Vec<OperationRecord>, StoreError>;
}

/// Rows derived from a batch before anything is written
pub(crate) struct PreparedBatch {
    pub records: Vec<(OperationRecord, Vec<TrackedEntity>)>,
    pub bindings: Vec<(Uuid, TrackedEntity)>,
}

impl PreparedBatch {
    /// Serialize every operation and reject ids repeated within the batch
    pub fn prepare(operations: &[PushOperation]) -> Result<Self, StoreError> {
        let mut seen = std::collections::HashSet::new();
        let mut records = Vec::with_capacity(operations.len());
        let mut bindings = Vec::new();
        let mut bound = std::collections::HashSet::new();

        for push in operations {
            let operation_id = push.operation.operation_id;
            if !seen.insert(operation_id) {
                return Err(StoreError::Conflict { operation_id });
            }

            let mut entities = push.operation.tracked_entities();
            entities.sort();
            entities.dedup();
            records.push((OperationRecord::from_operation(&push.operation)?, entities));

            for action in &push.bind_actions {
                for binding in action.bindings() {
                    if bound.insert(binding) {
                        bindings.push(binding);
                    }
                }
            }
        }

        Ok(Self { records, bindings })
    }

    pub fn operation_ids(&self) -> Vec<Uuid> {
        self.records.iter().map(|(record, _)| record.operation_id).collect()
    }
}
