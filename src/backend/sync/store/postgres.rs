/**
 * Postgres Operation Store
 *
 * Tables (see migrations/):
 *
 * - `operations` - one row per operation, payload bytes verbatim in `data`
 * - `operations_affecting_entity` - operation x tracked entity index, read by `get`
 * - `tracked_entities` - watcher bindings, user x entity
 * - `confirmed_operations` - user x device x operation delivery markers
 *
 * A push runs in one transaction. Binding inserts are insert-or-ignore so
 * concurrent fan-out to the same entity cannot duplicate or lose rows.
 */
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::backend::storage::error::is_unique_violation;
use crate::backend::storage::{FailedUnit, StoreError, UnitOfWork};
use crate::backend::sync::store::{OperationRecord, OperationStore, PreparedBatch, PushOperation};
use crate::shared::operations::{OperationPayloadType, OperationType, TrackedEntity};

const RECORD_COLUMNS: &str =
    "o.operation_id, o.created_at, o.author_id, o.operation_type, o.is_large, o.data, o.search_hint";

#[derive(Debug, Clone)]
pub struct PgOperationStore {
    pool: PgPool,
}

impl PgOperationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> Result<OperationRecord, StoreError> {
    let operation_id: Uuid = row.try_get("operation_id")?;
    let payload_type: String = row.try_get("operation_type")?;
    let payload_type = payload_type
        .parse::<OperationPayloadType>()
        .map_err(|e| StoreError::Corrupt {
            operation_id,
            message: e.to_string(),
        })?;

    Ok(OperationRecord {
        operation_id,
        created_at: row.try_get("created_at")?,
        author_id: row.try_get("author_id")?,
        payload_type,
        is_large: row.try_get("is_large")?,
        data: row.try_get("data")?,
        search_hint: row.try_get("search_hint")?,
    })
}

fn records_from_rows(rows: Vec<PgRow>) -> Result<Vec<OperationRecord>, StoreError> {
    rows.iter().map(record_from_row).collect()
}

/// Parallel id/type arrays for `UNNEST($1::uuid[], $2::text[])`
fn entity_arrays(entities: &[TrackedEntity]) -> (Vec<Uuid>, Vec<String>) {
    entities
        .iter()
        .map(|entity| (entity.entity_id, entity.entity_type.as_str().to_string()))
        .unzip()
}

#[derive(Debug)]
struct Applied {
    operation_ids: Vec<Uuid>,
    bindings: Vec<(Uuid, TrackedEntity)>,
}

struct PgPushUnit {
    pool: PgPool,
    batch: PreparedBatch,
    user_id: Uuid,
    device_id: String,
    confirm_origin_device: bool,
    applied: Mutex<Option<Applied>>,
}

#[async_trait]
impl UnitOfWork for PgPushUnit {
    async fn perform(&self) -> Result<(), StoreError> {
        let mut applied = self.applied.lock().await;
        // Dropping the transaction without commit rolls it back
        let mut tx = self.pool.begin().await?;

        for (record, entities) in &self.batch.records {
            let inserted = sqlx::query(
                r#"
                INSERT INTO operations (operation_id, created_at, author_id, operation_type, is_large, data, search_hint)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(record.operation_id)
            .bind(record.created_at)
            .bind(record.author_id)
            .bind(record.payload_type.as_str())
            .bind(record.is_large)
            .bind(record.data.as_slice())
            .bind(record.search_hint.as_deref())
            .execute(&mut *tx)
            .await;

            if let Err(e) = inserted {
                if is_unique_violation(&e) {
                    return Err(StoreError::Conflict {
                        operation_id: record.operation_id,
                    });
                }
                return Err(e.into());
            }

            for entity in entities {
                sqlx::query(
                    r#"
                    INSERT INTO operations_affecting_entity (operation_id, entity_id, entity_type)
                    VALUES ($1, $2, $3)
                    ON CONFLICT DO NOTHING
                    "#,
                )
                .bind(record.operation_id)
                .bind(entity.entity_id)
                .bind(entity.entity_type.as_str())
                .execute(&mut *tx)
                .await?;
            }

            if self.confirm_origin_device {
                sqlx::query(
                    r#"
                    INSERT INTO confirmed_operations (user_id, device_id, operation_id)
                    VALUES ($1, $2, $3)
                    ON CONFLICT DO NOTHING
                    "#,
                )
                .bind(self.user_id)
                .bind(&self.device_id)
                .bind(record.operation_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        let mut bindings = Vec::new();
        for (watcher, entity) in &self.batch.bindings {
            let row = sqlx::query(
                r#"
                INSERT INTO tracked_entities (user_id, entity_id, entity_type)
                VALUES ($1, $2, $3)
                ON CONFLICT DO NOTHING
                RETURNING user_id
                "#,
            )
            .bind(watcher)
            .bind(entity.entity_id)
            .bind(entity.entity_type.as_str())
            .fetch_optional(&mut *tx)
            .await?;

            if row.is_some() {
                bindings.push((*watcher, *entity));
            }
        }

        tx.commit().await?;

        tracing::debug!(
            "[Sync] Stored {} operation(s), {} new binding(s)",
            self.batch.records.len(),
            bindings.len()
        );
        *applied = Some(Applied {
            operation_ids: self.batch.operation_ids(),
            bindings,
        });
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        let mut applied = self.applied.lock().await;
        let Some(done) = applied.as_ref() else {
            return Ok(());
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM confirmed_operations WHERE operation_id = ANY($1)")
            .bind(done.operation_ids.as_slice())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM operations_affecting_entity WHERE operation_id = ANY($1)")
            .bind(done.operation_ids.as_slice())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM operations WHERE operation_id = ANY($1)")
            .bind(done.operation_ids.as_slice())
            .execute(&mut *tx)
            .await?;

        for (watcher, entity) in &done.bindings {
            sqlx::query(
                "DELETE FROM tracked_entities WHERE user_id = $1 AND entity_id = $2 AND entity_type = $3",
            )
            .bind(watcher)
            .bind(entity.entity_id)
            .bind(entity.entity_type.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        // Cleared only after commit so a failed rollback can be retried
        *applied = None;
        Ok(())
    }
}

struct PgConfirmUnit {
    pool: PgPool,
    user_id: Uuid,
    device_id: String,
    pending: Vec<Uuid>,
    /// Confirmations this unit actually inserted
    applied: Mutex<Option<Vec<Uuid>>>,
}

#[async_trait]
impl UnitOfWork for PgConfirmUnit {
    async fn perform(&self) -> Result<(), StoreError> {
        let mut applied = self.applied.lock().await;
        if self.pending.is_empty() {
            *applied = Some(Vec::new());
            return Ok(());
        }

        let rows = sqlx::query(
            r#"
            INSERT INTO confirmed_operations (user_id, device_id, operation_id)
            SELECT $1, $2, UNNEST($3::uuid[])
            ON CONFLICT DO NOTHING
            RETURNING operation_id
            "#,
        )
        .bind(self.user_id)
        .bind(&self.device_id)
        .bind(self.pending.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let inserted = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("operation_id"))
            .collect::<Result<Vec<_>, _>>()?;
        *applied = Some(inserted);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        let mut applied = self.applied.lock().await;
        let Some(inserted) = applied.as_ref() else {
            return Ok(());
        };

        if !inserted.is_empty() {
            sqlx::query(
                r#"
                DELETE FROM confirmed_operations
                WHERE user_id = $1 AND device_id = $2 AND operation_id = ANY($3)
                "#,
            )
            .bind(self.user_id)
            .bind(&self.device_id)
            .bind(inserted.as_slice())
            .execute(&self.pool)
            .await?;
        }

        *applied = None;
        Ok(())
    }
}

impl PgOperationStore {
    /// Requested ids that exist and are not yet confirmed for the device
    async fn pending_confirmations(
        &self,
        operation_ids: &[Uuid],
        user_id: Uuid,
        device_id: &str,
    ) -> Result<Vec<Uuid>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT o.operation_id
            FROM operations o
            WHERE o.operation_id = ANY($3)
              AND NOT EXISTS (
                SELECT 1 FROM confirmed_operations c
                WHERE c.user_id = $1 AND c.device_id = $2 AND c.operation_id = o.operation_id
              )
            "#,
        )
        .bind(user_id)
        .bind(device_id)
        .bind(operation_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<Uuid, _>("operation_id").map_err(StoreError::from))
            .collect()
    }
}

#[async_trait]
impl OperationStore for PgOperationStore {
    fn push(
        &self,
        operations: Vec<PushOperation>,
        user_id: Uuid,
        device_id: &str,
        confirm_origin_device: bool,
    ) -> Box<dyn UnitOfWork> {
        match PreparedBatch::prepare(&operations) {
            Ok(batch) => Box::new(PgPushUnit {
                pool: self.pool.clone(),
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
        let sql = format!(
            r#"
            SELECT DISTINCT {RECORD_COLUMNS}
            FROM operations o
            JOIN operations_affecting_entity a ON a.operation_id = o.operation_id
            JOIN tracked_entities t ON t.entity_id = a.entity_id AND t.entity_type = a.entity_type
            WHERE t.user_id = $1
              AND o.is_large = $3
              AND NOT EXISTS (
                SELECT 1 FROM confirmed_operations c
                WHERE c.user_id = $1 AND c.device_id = $2 AND c.operation_id = o.operation_id
              )
            ORDER BY o.created_at, o.operation_id
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(device_id)
            .bind(operation_type.is_large())
            .fetch_all(&self.pool)
            .await?;

        records_from_rows(rows)
    }

    async fn confirm(
        &self,
        operation_ids: &[Uuid],
        user_id: Uuid,
        device_id: &str,
    ) -> Box<dyn UnitOfWork> {
        match self.pending_confirmations(operation_ids, user_id, device_id).await {
            Ok(pending) => Box::new(PgConfirmUnit {
                pool: self.pool.clone(),
                user_id,
                device_id: device_id.to_string(),
                pending,
                applied: Mutex::new(None),
            }),
            Err(e) => {
                tracing::error!("[Sync] Confirmation snapshot failed: {}", e);
                FailedUnit::boxed(e)
            }
        }
    }

    async fn get_users(&self, entities: &[TrackedEntity]) -> Result<Vec<Uuid>, StoreError> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }

        let (ids, types) = entity_arrays(entities);
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT t.user_id
            FROM tracked_entities t
            JOIN UNNEST($1::uuid[], $2::text[]) AS e(entity_id, entity_type)
              ON e.entity_id = t.entity_id AND e.entity_type = t.entity_type
            ORDER BY t.user_id
            "#,
        )
        .bind(ids.as_slice())
        .bind(types.as_slice())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<Uuid, _>("user_id").map_err(StoreError::from))
            .collect()
    }

    async fn get(&self, entities: &[TrackedEntity]) -> Result<Vec<OperationRecord>, StoreError> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }

        let (ids, types) = entity_arrays(entities);
        let sql = format!(
            r#"
            SELECT DISTINCT {RECORD_COLUMNS}
            FROM operations o
            JOIN operations_affecting_entity a ON a.operation_id = o.operation_id
            JOIN UNNEST($1::uuid[], $2::text[]) AS e(entity_id, entity_type)
              ON e.entity_id = a.entity_id AND e.entity_type = a.entity_type
            ORDER BY o.created_at, o.operation_id
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(ids.as_slice())
            .bind(types.as_slice())
            .fetch_all(&self.pool)
            .await?;

        records_from_rows(rows)
    }

    async fn search(
        &self,
        payload_type: OperationPayloadType,
        hint: &str,
    ) -> Result<Vec<OperationRecord>, StoreError> {
        let sql = format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM operations o
            WHERE o.operation_type = $1
              AND o.search_hint IS NOT NULL
              AND strpos(lower(o.search_hint), lower($2)) > 0
            ORDER BY o.created_at, o.operation_id
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(payload_type.as_str())
            .bind(hint)
            .fetch_all(&self.pool)
            .await?;

        records_from_rows(rows)
    }
}
