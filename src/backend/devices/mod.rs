//! Devices Module
//!
//! Per-device push tokens. A user signs in on several devices; each device
//! registers the token its platform push service handed it, and alerts for
//! the user fan out to every registered token.
//!
//! - **`postgres`** - `PgDeviceRegistry` over the `devices` table
//! - **`memory`** - `MemoryDeviceRegistry` for tests and `storage = "memory"`
//! - **`handlers`** - `PUT /api/devices/push-token`

pub mod handlers;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::storage::StoreError;

pub use handlers::register_push_token;
pub use memory::MemoryDeviceRegistry;
pub use postgres::PgDeviceRegistry;

/// Push token registered by one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceToken {
    pub device_id: String,
    pub push_token: String,
}

#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Store or replace the push token of one device
    async fn set_push_token(&self, user_id: Uuid, device_id: &str, token: &str) -> Result<(), StoreError>;

    /// Every token registered by the user's devices
    async fn push_tokens(&self, user_id: Uuid) -> Result<Vec<DeviceToken>, StoreError>;
}
