/**
 * API Route Handlers
 *
 * Account and device endpoints.
 *
 * # Routes
 *
 * ## Authentication
 * - `POST /api/auth/signup` - User registration (public)
 * - `POST /api/auth/login` - User login (public)
 * - `GET /api/auth/me` - Current user (authenticated)
 *
 * ## Devices
 * - `PUT /api/devices/push-token` - Register the caller device's push token (authenticated)
 */
use axum::routing::{get, post, put};
use axum::Router;

use crate::backend::auth::{get_me, login, signup};
use crate::backend::devices::register_push_token;
use crate::backend::server::state::AppState;

/// Routes that do not need a session
pub fn configure_public_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
}

/// Routes that require a bearer token. The caller adds the auth layer.
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/auth/me", get(get_me))
        .route("/api/devices/push-token", put(register_push_token))
}
