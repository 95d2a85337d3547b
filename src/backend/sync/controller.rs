/**
 * Sync Controller
 *
 * Orchestration above the operation store. Persistence errors are returned
 * to the caller; everything that happens after a successful push (realtime
 * wake-ups, alerts, name resolution) is best-effort and only logged.
 */
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::devices::DeviceRegistry;
use crate::backend::notifications::PushSender;
use crate::backend::realtime::RealtimeNotifier;
use crate::backend::storage::UnitOfWork;
use crate::backend::sync::display::{current_display_names, current_group_names, format_alert, wants_alert};
use crate::backend::sync::store::{decode_all, OperationStore, PushOperation};
use crate::backend::sync::SyncError;
use crate::shared::operations::{
    Operation, OperationPayload, OperationPayloadType, OperationType, PulledOperation,
    TrackedEntity, UserSearchResult, WireOperation,
};

#[derive(Clone)]
pub struct SyncController {
    store: Arc<dyn OperationStore>,
    notifier: Arc<dyn RealtimeNotifier>,
    push_sender: Arc<dyn PushSender>,
    devices: Arc<dyn DeviceRegistry>,
}

impl SyncController {
    pub fn new(
        store: Arc<dyn OperationStore>,
        notifier: Arc<dyn RealtimeNotifier>,
        push_sender: Arc<dyn PushSender>,
        devices: Arc<dyn DeviceRegistry>,
    ) -> Self {
        Self {
            store,
            notifier,
            push_sender,
            devices,
        }
    }

    /// Validate and append a client batch, then notify watchers.
    ///
    /// The pushing device is confirmed immediately so it never pulls back
    /// its own writes. Returns the number of operations stored.
    pub async fn push(
        &self,
        operations: Vec<WireOperation>,
        user_id: Uuid,
        device_id: &str,
    ) -> Result<usize, SyncError> {
        let operations = operations
            .into_iter()
            .map(|wire| wire.into_operation(user_id))
            .collect::<Result<Vec<_>, _>>()?;

        if operations.is_empty() {
            return Ok(0);
        }

        let batch = operations.iter().cloned().map(PushOperation::resolve).collect();
        self.store
            .push(batch, user_id, device_id, true)
            .perform()
            .await
            .map_err(SyncError::store("push operations"))?;

        tracing::info!(
            "[Sync] User {} pushed {} operation(s) from device {}",
            user_id,
            operations.len(),
            device_id
        );

        self.notify_watchers(&operations, user_id, device_id).await;
        Ok(operations.len())
    }

    /// Unit appending an operation the server authors itself (signup's
    /// `CreateUser`). Not confirmed for any device: every device of the new
    /// user pulls it.
    pub fn append_server_operation(&self, operation: Operation, device_id: &str) -> Box<dyn UnitOfWork> {
        let author = operation.author_id;
        self.store
            .push(vec![PushOperation::resolve(operation)], author, device_id, false)
    }

    /// Undelivered operations for one device, oldest first
    pub async fn pull(
        &self,
        user_id: Uuid,
        device_id: &str,
        operation_type: OperationType,
    ) -> Result<Vec<PulledOperation>, SyncError> {
        let records = self
            .store
            .pull(user_id, device_id, operation_type)
            .await
            .map_err(SyncError::store("pull operations"))?;
        let operations = decode_all(&records).map_err(SyncError::store("decode pulled operations"))?;

        tracing::debug!(
            "[Sync] Device {} of user {} pulled {} {:?} operation(s)",
            device_id,
            user_id,
            operations.len(),
            operation_type
        );
        Ok(operations.into_iter().map(PulledOperation::from).collect())
    }

    /// Mark operations delivered to one device. Unknown and already
    /// confirmed ids are accepted silently. Returns the number of distinct
    /// ids acknowledged.
    pub async fn confirm(
        &self,
        operation_ids: &[Uuid],
        user_id: Uuid,
        device_id: &str,
    ) -> Result<usize, SyncError> {
        let distinct: HashSet<Uuid> = operation_ids.iter().copied().collect();
        if distinct.is_empty() {
            return Ok(0);
        }

        self.store
            .confirm(operation_ids, user_id, device_id)
            .await
            .perform()
            .await
            .map_err(SyncError::store("confirm operations"))?;

        Ok(distinct.len())
    }

    /// Users whose current display name contains `query`, case-insensitively
    pub async fn search_users(&self, query: &str) -> Result<Vec<UserSearchResult>, SyncError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        // Candidates: anyone who ever carried a matching name
        let mut candidates = BTreeSet::new();
        for payload_type in [OperationPayloadType::CreateUser, OperationPayloadType::UpdateDisplayName] {
            let records = self
                .store
                .search(payload_type, query)
                .await
                .map_err(SyncError::store("search users"))?;
            for operation in decode_all(&records).map_err(SyncError::store("decode search hits"))? {
                match operation.payload {
                    OperationPayload::CreateUser(p) => {
                        candidates.insert(p.user_id);
                    }
                    OperationPayload::UpdateDisplayName(p) => {
                        candidates.insert(p.user_id);
                    }
                    _ => {}
                }
            }
        }

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        // Keep only those whose name still matches
        let entities: Vec<TrackedEntity> = candidates.iter().copied().map(TrackedEntity::user).collect();
        let records = self
            .store
            .get(&entities)
            .await
            .map_err(SyncError::store("load user history"))?;
        let names = current_display_names(&decode_all(&records).map_err(SyncError::store("decode user history"))?);

        let needle = query.to_lowercase();
        let mut results: Vec<UserSearchResult> = candidates
            .into_iter()
            .filter_map(|user_id| {
                names
                    .get(&user_id)
                    .filter(|name| name.to_lowercase().contains(&needle))
                    .map(|name| UserSearchResult {
                        user_id,
                        display_name: name.clone(),
                    })
            })
            .collect();
        results.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then(a.user_id.cmp(&b.user_id))
        });
        Ok(results)
    }

    async fn notify_watchers(&self, operations: &[Operation], author_id: Uuid, origin_device: &str) {
        let mut channels: HashMap<Uuid, Vec<OperationType>> = HashMap::new();

        for operation in operations {
            let watchers = match self.store.get_users(&operation.tracked_entities()).await {
                Ok(watchers) => watchers,
                Err(e) => {
                    tracing::warn!(
                        "[Sync] Could not resolve watchers of {}: {}",
                        operation.operation_id,
                        e
                    );
                    continue;
                }
            };

            let channel = OperationType::for_operation(operation);
            for watcher in &watchers {
                let entry = channels.entry(*watcher).or_default();
                if !entry.contains(&channel) {
                    entry.push(channel);
                }
            }

            if wants_alert(operation) {
                self.send_alerts(operation, &watchers).await;
            }
        }

        for (user_id, channels) in channels {
            let exclude = if user_id == author_id {
                vec![origin_device.to_string()]
            } else {
                Vec::new()
            };
            if let Err(e) = self.notifier.notify_update(user_id, &exclude, &channels).await {
                tracing::warn!("[Realtime] Failed to notify user {}: {}", user_id, e);
            }
        }
    }

    async fn send_alerts(&self, operation: &Operation, watchers: &[Uuid]) {
        let recipients: Vec<Uuid> = watchers
            .iter()
            .copied()
            .filter(|watcher| *watcher != operation.author_id)
            .collect();
        if recipients.is_empty() {
            return;
        }

        let author_name = self.display_name(operation.author_id).await;
        let group_name = match &operation.payload {
            OperationPayload::CreateSpending(p) => self.group_name(p.group_id).await,
            _ => None,
        };
        let Some(alert) = format_alert(operation, author_name.as_deref(), group_name.as_deref()) else {
            return;
        };

        for recipient in recipients {
            let tokens = match self.devices.push_tokens(recipient).await {
                Ok(tokens) => tokens,
                Err(e) => {
                    tracing::warn!("[Push] Could not load devices of user {}: {}", recipient, e);
                    continue;
                }
            };

            for device in tokens {
                if let Err(e) = self.push_sender.alert(&device.push_token, &alert).await {
                    tracing::warn!(
                        "[Push] Alert to device {} of user {} failed: {}",
                        device.device_id,
                        recipient,
                        e
                    );
                }
            }
        }
    }

    async fn display_name(&self, user_id: Uuid) -> Option<String> {
        let operations = self.replay(&[TrackedEntity::user(user_id)]).await?;
        current_display_names(&operations).remove(&user_id)
    }

    async fn group_name(&self, group_id: Uuid) -> Option<String> {
        let operations = self.replay(&[TrackedEntity::spending_group(group_id)]).await?;
        current_group_names(&operations).remove(&group_id)
    }

    async fn replay(&self, entities: &[TrackedEntity]) -> Option<Vec<Operation>> {
        let result = match self.store.get(entities).await {
            Ok(records) => decode_all(&records),
            Err(e) => Err(e),
        };
        match result {
            Ok(operations) => Some(operations),
            Err(e) => {
                tracing::warn!("[Push] Name resolution failed: {}", e);
                None
            }
        }
    }
}
