use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::devices::{DeviceRegistry, DeviceToken};
use crate::backend::storage::StoreError;

/// Device registry held in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryDeviceRegistry {
    tokens: Arc<RwLock<BTreeMap<(Uuid, String), String>>>,
}

impl MemoryDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceRegistry for MemoryDeviceRegistry {
    async fn set_push_token(&self, user_id: Uuid, device_id: &str, token: &str) -> Result<(), StoreError> {
        self.tokens
            .write()
            .await
            .insert((user_id, device_id.to_string()), token.to_string());
        Ok(())
    }

    async fn push_tokens(&self, user_id: Uuid) -> Result<Vec<DeviceToken>, StoreError> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .iter()
            .filter(|((owner, _), _)| *owner == user_id)
            .map(|((_, device_id), token)| DeviceToken {
                device_id: device_id.clone(),
                push_token: token.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_token_is_replaced_per_device() {
        let registry = MemoryDeviceRegistry::new();
        let user = Uuid::new_v4();

        registry.set_push_token(user, "phone", "old").await.unwrap();
        registry.set_push_token(user, "phone", "new").await.unwrap();
        registry.set_push_token(user, "tablet", "tab").await.unwrap();
        registry.set_push_token(Uuid::new_v4(), "phone", "other").await.unwrap();

        let tokens = registry.push_tokens(user).await.unwrap();
        assert_eq!(
            tokens,
            vec![
                DeviceToken {
                    device_id: "phone".to_string(),
                    push_token: "new".to_string()
                },
                DeviceToken {
                    device_id: "tablet".to_string(),
                    push_token: "tab".to_string()
                },
            ]
        );
    }
}
