/**
 * Real-time Event Broadcasting
 *
 * Events are broadcast using `tokio::sync::broadcast`, a multi-producer,
 * multi-consumer channel. Every subscriber receives a copy of each event and
 * keeps only the ones addressed to its own (user, device).
 */
use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::backend::notifications::NotifyError;
use crate::shared::operations::OperationType;
use crate::shared::RealtimeEvent;

/// Event routed to one user's devices
#[derive(Debug, Clone, PartialEq)]
pub struct AddressedEvent {
    pub user_id: Uuid,
    /// Devices of `user_id` that must not receive the event
    pub exclude_devices: Vec<String>,
    pub event: RealtimeEvent,
}

impl AddressedEvent {
    pub fn is_for(&self, user_id: Uuid, device_id: &str) -> bool {
        self.user_id == user_id && !self.exclude_devices.iter().any(|d| d == device_id)
    }
}

/// Real-time update event broadcast
///
/// Cloned into application state so any handler can publish.
pub type RealtimeEventBroadcast = broadcast::Sender<AddressedEvent>;

/// Real-time notification sink
#[async_trait]
pub trait RealtimeNotifier: Send + Sync {
    /// Tell a user's devices, except `exclude_devices`, that the given
    /// channels have new operations. Returns the number of live subscribers.
    async fn notify_update(
        &self,
        user_id: Uuid,
        exclude_devices: &[String],
        channels: &[OperationType],
    ) -> Result<usize, NotifyError>;
}

/// Broadcast a real-time event to all subscribers
///
/// # Returns
///
/// Number of active subscribers that received the event (0 if no subscribers)
pub async fn broadcast_event(broadcast_tx: &RealtimeEventBroadcast, event: AddressedEvent) -> usize {
    match broadcast_tx.send(event) {
        Ok(subscriber_count) => {
            tracing::debug!("[Realtime] Event broadcast to {} subscribers", subscriber_count);
            subscriber_count
        }
        Err(e) => {
            // No subscribers, that's okay
            tracing::debug!("[Realtime] No subscribers to receive event for user {}", e.0.user_id);
            0
        }
    }
}

#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    broadcast_tx: RealtimeEventBroadcast,
}

impl BroadcastNotifier {
    pub fn new(broadcast_tx: RealtimeEventBroadcast) -> Self {
        Self { broadcast_tx }
    }
}

#[async_trait]
impl RealtimeNotifier for BroadcastNotifier {
    async fn notify_update(
        &self,
        user_id: Uuid,
        exclude_devices: &[String],
        channels: &[OperationType],
    ) -> Result<usize, NotifyError> {
        let event = AddressedEvent {
            user_id,
            exclude_devices: exclude_devices.to_vec(),
            event: RealtimeEvent::operations_available(channels),
        };
        Ok(broadcast_event(&self.broadcast_tx, event).await)
    }
}
