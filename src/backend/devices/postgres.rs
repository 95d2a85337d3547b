use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::backend::devices::{DeviceRegistry, DeviceToken};
use crate::backend::storage::StoreError;

/// Device registry over the `devices` table
#[derive(Debug, Clone)]
pub struct PgDeviceRegistry {
    pool: PgPool,
}

impl PgDeviceRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRegistry for PgDeviceRegistry {
    async fn set_push_token(&self, user_id: Uuid, device_id: &str, token: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO devices (user_id, device_id, push_token, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, device_id)
            DO UPDATE SET push_token = EXCLUDED.push_token, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(device_id)
        .bind(token)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn push_tokens(&self, user_id: Uuid) -> Result<Vec<DeviceToken>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT device_id, push_token
            FROM devices
            WHERE user_id = $1 AND push_token IS NOT NULL
            ORDER BY device_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| DeviceToken {
                device_id: row.get("device_id"),
                push_token: row.get("push_token"),
            })
            .collect())
    }
}
