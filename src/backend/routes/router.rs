/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Groups
 *
 * 1. Public routes (health check, signup, login)
 * 2. Protected routes (sync, devices, current user), wrapped in
 *    `auth_middleware` with `route_layer` so unknown paths still 404
 *    instead of 401
 * 3. Fallback handler (404)
 */
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::backend::middleware::auth_middleware;
use crate::backend::routes::api_routes::{configure_api_routes, configure_public_api_routes};
use crate::backend::routes::sync_routes::configure_sync_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state containing repositories and the sync controller
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub fn create_router(app_state: AppState) -> Router<()> {
    let public = Router::new().route("/health", get(health));
    let public = configure_public_api_routes(public);

    let protected = configure_sync_routes(Router::new());
    let protected = configure_api_routes(protected)
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware));

    public
        .merge(protected)
        .fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn health() -> &'static str {
    "ok"
}
