/**
 * Sync Routes
 *
 * - `POST /api/operations/push` - Append a batch of operations
 * - `GET /api/operations?type=regular|large` - Pull unconfirmed operations
 * - `POST /api/operations/confirm` - Acknowledge pulled operations
 * - `GET /api/users/search?query=` - Find users by current display name
 * - `GET /api/realtime` - SSE stream of wake-up events
 *
 * All of them require a bearer token; the caller adds the auth layer.
 */
use axum::routing::{get, post};
use axum::Router;

use crate::backend::realtime::handle_realtime_subscription;
use crate::backend::server::state::AppState;
use crate::backend::sync::handlers::{confirm_operations, pull_operations, push_operations, search_users};

pub fn configure_sync_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/operations", get(pull_operations))
        .route("/api/operations/push", post(push_operations))
        .route("/api/operations/confirm", post(confirm_operations))
        .route("/api/users/search", get(search_users))
        .route("/api/realtime", get(handle_realtime_subscription))
}
