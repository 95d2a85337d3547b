/**
 * Application State
 *
 * `AppState` is the single state container shared by every handler. It is
 * cheap to clone: every field is an `Arc`, a channel sender or a struct of
 * `Arc`s. `FromRef` implementations let handlers extract only the part
 * they need (`State<SyncController>`, `State<RealtimeEventBroadcast>`).
 */
use axum::extract::FromRef;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::backend::auth::sessions::SessionKeys;
use crate::backend::auth::users::UserRepository;
use crate::backend::devices::DeviceRegistry;
use crate::backend::notifications::PushSender;
use crate::backend::realtime::broadcast::{AddressedEvent, BroadcastNotifier, RealtimeEventBroadcast};
use crate::backend::server::config::ServerConfig;
use crate::backend::storage::Repositories;
use crate::backend::sync::SyncController;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,

    /// Token signing and verification
    pub sessions: SessionKeys,

    /// Credentials repository
    pub users: Arc<dyn UserRepository>,

    /// Push-token registry
    pub devices: Arc<dyn DeviceRegistry>,

    /// Sync engine entry point
    pub sync: SyncController,

    /// Realtime event channel read by every SSE subscriber
    pub realtime_broadcast: RealtimeEventBroadcast,
}

impl AppState {
    /// Wire repositories and the push sender into a state
    pub fn new(config: ServerConfig, repositories: Repositories, push_sender: Arc<dyn PushSender>) -> Self {
        let (realtime_broadcast, _) = broadcast::channel::<AddressedEvent>(config.realtime_capacity.max(1));
        let notifier = Arc::new(BroadcastNotifier::new(realtime_broadcast.clone()));

        let sync = SyncController::new(
            repositories.operations,
            notifier,
            push_sender,
            Arc::clone(&repositories.devices),
        );

        Self {
            sessions: SessionKeys::new(&config.jwt_secret, config.token_ttl_days),
            config: Arc::new(config),
            users: repositories.users,
            devices: repositories.devices,
            sync,
            realtime_broadcast,
        }
    }
}

impl FromRef<AppState> for SyncController {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sync.clone()
    }
}

impl FromRef<AppState> for RealtimeEventBroadcast {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.realtime_broadcast.clone()
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<dyn UserRepository> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.users)
    }
}
