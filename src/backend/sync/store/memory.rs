/**
 * In-memory Operation Store
 *
 * Mirrors the four sync tables as hash sets behind one `RwLock`. Every unit
 * validates before it mutates, so a failed `perform` leaves no trace and the
 * store never needs a transaction log.
 */
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::backend::storage::{FailedUnit, StoreError, UnitOfWork};
use crate::backend::sync::store::{OperationRecord, OperationStore, PreparedBatch, PushOperation};
use crate::shared::operations::{OperationPayloadType, OperationType, TrackedEntity};

#[derive(Debug, Default)]
struct Tables {
    operations: HashMap<Uuid, OperationRecord>,
    /// (operation, entity)
    affecting: HashSet<(Uuid, TrackedEntity)>,
    /// (user, entity)
    tracked: HashSet<(Uuid, TrackedEntity)>,
    /// (user, device, operation)
    confirmed: HashSet<(Uuid, String, Uuid)>,
}

impl Tables {
    fn operations_affecting(&self, entities: &HashSet<TrackedEntity>) -> HashSet<Uuid> {
        self.affecting
            .iter()
            .filter(|(_, entity)| entities.contains(entity))
            .map(|(operation_id, _)| *operation_id)
            .collect()
    }

    fn records_sorted(&self, ids: impl IntoIterator<Item = Uuid>) -> Vec<OperationRecord> {
        let mut records: Vec<OperationRecord> = ids
            .into_iter()
            .filter_map(|id| self.operations.get(&id).cloned())
            .collect();
        records.sort_by_key(OperationRecord::sort_key);
        records
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryOperationStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryOperationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows per table, in schema order
    pub async fn row_counts(&self) -> [usize; 4] {
        let tables = self.tables.read().await;
        [
            tables.operations.len(),
            tables.affecting.len(),
            tables.tracked.len(),
            tables.confirmed.len(),
        ]
    }
}

/// What a successful push wrote, so rollback removes only that
#[derive(Debug)]
struct Applied {
    operation_ids: Vec<Uuid>,
    bindings: Vec<(Uuid, TrackedEntity)>,
}

struct MemoryPushUnit {
    tables: Arc<RwLock<Tables>>,
    batch: PreparedBatch,
    user_id: Uuid,
    device_id: String,
    confirm_origin_device: bool,
    applied: Mutex<Option<Applied>>,
}

#[async_trait]
impl UnitOfWork for MemoryPushUnit {
    async fn perform(&self) -> Result<(), StoreError> {
        let mut applied = self.applied.lock().await;
        let mut tables = self.tables.write().await;

        if let Some((record, _)) = self
            .batch
            .records
            .iter()
            .find(|(record, _)| tables.operations.contains_key(&record.operation_id))
        {
            return Err(StoreError::Conflict {
                operation_id: record.operation_id,
            });
        }

        for (record, entities) in &self.batch.records {
            for entity in entities {
                tables.affecting.insert((record.operation_id, *entity));
            }
            if self.confirm_origin_device {
                tables
                    .confirmed
                    .insert((self.user_id, self.device_id.clone(), record.operation_id));
            }
            tables.operations.insert(record.operation_id, record.clone());
        }

        let mut inserted = Vec::new();
        for binding in &self.batch.bindings {
            if tables.tracked.insert(*binding) {
                inserted.push(*binding);
            }
        }

        *applied = Some(Applied {
            operation_ids: self.batch.operation_ids(),
            bindings: inserted,
        });
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        let mut applied = self.applied.lock().await;
        let Some(done) = applied.take() else {
            return Ok(());
        };

        let mut tables = self.tables.write().await;
        let ids: HashSet<Uuid> = done.operation_ids.iter().copied().collect();
        tables.confirmed.retain(|(_, _, operation_id)| !ids.contains(operation_id));
        tables.affecting.retain(|(operation_id, _)| !ids.contains(operation_id));
        tables.operations.retain(|operation_id, _| !ids.contains(operation_id));
        for binding in &done.bindings {
            tables.tracked.remove(binding);
        }
        Ok(())
    }
}

struct MemoryConfirmUnit {
    tables: Arc<RwLock<Tables>>,
    user_id: Uuid,
    device_id: String,
    /// Ids that existed and were unconfirmed when the unit was built
    pending: Vec<Uuid>,
    /// Confirmations this unit actually inserted
    applied: Mutex<Option<Vec<Uuid>>>,
}

#[async_trait]
impl UnitOfWork for MemoryConfirmUnit {
    async fn perform(&self) -> Result<(), StoreError> {
        let mut applied = self.applied.lock().await;
        let mut tables = self.tables.write().await;
        let inserted = self
            .pending
            .iter()
            .copied()
            .filter(|operation_id| {
                tables
                    .confirmed
                    .insert((self.user_id, self.device_id.clone(), *operation_id))
            })
            .collect();
        *applied = Some(inserted);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        let mut applied = self.applied.lock().await;
        let Some(inserted) = applied.take() else {
            return Ok(());
        };

        let mut tables = self.tables.write().await;
        for operation_id in inserted {
            tables
                .confirmed
                .remove(&(self.user_id, self.device_id.clone(), operation_id));
        }
        Ok(())
    }
}

#[async_trait]
impl OperationStore for MemoryOperationStore {
    fn push(
        &self,
        operations: Vec<PushOperation>,
        user_id: Uuid,
        device_id: &str,
        confirm_origin_device: bool,
    ) -> Box<dyn UnitOfWork> {
        match PreparedBatch::prepare(&operations) {
            Ok(batch) => Box::new(MemoryPushUnit {
                tables: Arc::clone(&self.tables),
                batch,
                user_id,
                device_id: device_id.to_string(),
                confirm_origin_device,
                applied: Mutex::new(None),
            }),
            Err(e) => FailedUnit::boxed(e),
        }
    }

    async fn pull(
        &self,
        user_id: Uuid,
        device_id: &str,
        operation_type: OperationType,
    ) -> Result<Vec<OperationRecord>, StoreError> {
        let tables = self.tables.read().await;
        let watched: HashSet<TrackedEntity> = tables
            .tracked
            .iter()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, entity)| *entity)
            .collect();

        let visible = tables.operations_affecting(&watched).into_iter().filter(|operation_id| {
            let on_channel = tables
                .operations
                .get(operation_id)
                .is_some_and(|record| record.is_large == operation_type.is_large());
            on_channel
                && !tables
                    .confirmed
                    .contains(&(user_id, device_id.to_string(), *operation_id))
        });

        Ok(tables.records_sorted(visible.collect::<Vec<_>>()))
    }

    async fn confirm(
        &self,
        operation_ids: &[Uuid],
        user_id: Uuid,
        device_id: &str,
    ) -> Box<dyn UnitOfWork> {
        let tables = self.tables.read().await;
        let mut seen = HashSet::new();
        let pending = operation_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .filter(|id| tables.operations.contains_key(id))
            .filter(|id| {
                !tables
                    .confirmed
                    .contains(&(user_id, device_id.to_string(), *id))
            })
            .collect();

        Box::new(MemoryConfirmUnit {
            tables: Arc::clone(&self.tables),
            user_id,
            device_id: device_id.to_string(),
            pending,
            applied: Mutex::new(None),
        })
    }

    async fn get_users(&self, entities: &[TrackedEntity]) -> Result<Vec<Uuid>, StoreError> {
        let wanted: HashSet<&TrackedEntity> = entities.iter().collect();
        let tables = self.tables.read().await;
        let mut users: Vec<Uuid> = tables
            .tracked
            .iter()
            .filter(|(_, entity)| wanted.contains(entity))
            .map(|(user, _)| *user)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        users.sort();
        Ok(users)
    }

    async fn get(&self, entities: &[TrackedEntity]) -> Result<Vec<OperationRecord>, StoreError> {
        let wanted: HashSet<TrackedEntity> = entities.iter().copied().collect();
        let tables = self.tables.read().await;
        Ok(tables.records_sorted(tables.operations_affecting(&wanted)))
    }

    async fn search(
        &self,
        payload_type: OperationPayloadType,
        hint: &str,
    ) -> Result<Vec<OperationRecord>, StoreError> {
        let needle = hint.to_lowercase();
        let tables = self.tables.read().await;
        let matches = tables
            .operations
            .values()
            .filter(|record| record.payload_type == payload_type)
            .filter(|record| {
                record
                    .search_hint
                    .as_ref()
                    .is_some_and(|h| h.to_lowercase().contains(&needle))
            })
            .map(|record| record.operation_id)
            .collect::<Vec<_>>();
        Ok(tables.records_sorted(matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::operations::payload::{CreateSpendingGroup, CreateUser, UploadImage};
    use crate::shared::operations::{Operation, OperationPayload};
    use pretty_assertions::assert_eq;

    fn create_user(user: Uuid, name: &str, created_at: i64) -> PushOperation {
        PushOperation::resolve(Operation::new(
            Uuid::new_v4(),
            created_at,
            user,
            OperationPayload::CreateUser(CreateUser {
                user_id: user,
                display_name: name.to_string(),
            }),
        ))
    }

    #[tokio::test]
    async fn test_failed_push_leaves_no_rows() {
        let store = MemoryOperationStore::new();
        let user = Uuid::new_v4();
        let first = create_user(user, "Alice", 1);
        store.push(vec![first.clone()], user, "d1", true).perform().await.unwrap();
        let before = store.row_counts().await;

        // second op is fine, first collides: nothing from the batch may land
        let batch = vec![create_user(Uuid::new_v4(), "Bob", 2), first];
        let error = store.push(batch, user, "d1", true).perform().await.unwrap_err();
        assert!(matches!(error, StoreError::Conflict { .. }));
        assert_eq!(store.row_counts().await, before);
    }

    #[tokio::test]
    async fn test_rollback_keeps_bindings_it_did_not_add() {
        let store = MemoryOperationStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let group = |id: Uuid| {
            PushOperation::resolve(Operation::new(
                Uuid::new_v4(),
                5,
                a,
                OperationPayload::CreateSpendingGroup(CreateSpendingGroup {
                    group_id: id,
                    name: "Flat".to_string(),
                    participants: vec![a, b],
                }),
            ))
        };

        store.push(vec![group(Uuid::new_v4())], a, "d1", true).perform().await.unwrap();
        let before = store.row_counts().await;

        let second = store.push(vec![group(Uuid::new_v4())], a, "d1", true);
        second.perform().await.unwrap();
        second.rollback().await.unwrap();

        assert_eq!(store.row_counts().await, before);
        // user bindings from the first group survive
        assert_eq!(store.get_users(&[TrackedEntity::user(b)]).await.unwrap(), vec![a]);
    }

    #[tokio::test]
    async fn test_rollback_without_perform_is_noop() {
        let store = MemoryOperationStore::new();
        let user = Uuid::new_v4();
        let op = create_user(user, "Alice", 1);
        store.push(vec![op.clone()], user, "d1", true).perform().await.unwrap();

        // a conflicting push never applied anything, so its rollback must
        // not remove the original
        let conflicting = store.push(vec![op], user, "d1", true);
        assert!(conflicting.perform().await.is_err());
        conflicting.rollback().await.unwrap();
        assert_eq!(store.row_counts().await, [1, 1, 1, 1]);
    }

    #[tokio::test]
    async fn test_large_channel() {
        let store = MemoryOperationStore::new();
        let user = Uuid::new_v4();
        let image_id = Uuid::new_v4();
        store.push(vec![create_user(user, "Alice", 1)], user, "d1", false).perform().await.unwrap();

        // UploadImage binds nothing itself
        let upload = PushOperation::new(
            Operation::new(
                Uuid::new_v4(),
                2,
                user,
                OperationPayload::UploadImage(UploadImage {
                    image_id,
                    content_type: "image/png".to_string(),
                    data: "aGk=".to_string(),
                }),
            ),
            vec![crate::backend::sync::fanout::EntityBindAction::new(
                TrackedEntity::image(image_id),
                vec![user],
            )],
        );
        store.push(vec![upload], user, "d1", false).perform().await.unwrap();

        let regular = store.pull(user, "d1", OperationType::Regular).await.unwrap();
        let large = store.pull(user, "d1", OperationType::Large).await.unwrap();
        assert_eq!(regular.len(), 1);
        assert!(!regular[0].is_large);
        assert_eq!(large.len(), 1);
        assert_eq!(large[0].payload_type, OperationPayloadType::UploadImage);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let store = MemoryOperationStore::new();
        let user = Uuid::new_v4();
        store.push(vec![create_user(user, "Alice", 1)], user, "d1", true).perform().await.unwrap();

        let hits = store.search(OperationPayloadType::CreateUser, "aLI").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(store
            .search(OperationPayloadType::UpdateDisplayName, "ali")
            .await
            .unwrap()
            .is_empty());
    }
}
