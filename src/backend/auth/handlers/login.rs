/**
 * Login Handler
 *
 * POST /api/auth/login
 *
 * Invalid credentials return 401 whether the user is unknown or the
 * password is wrong.
 */
use axum::{extract::State, http::StatusCode, response::Json};
use bcrypt::verify;

use crate::backend::auth::handlers::types::{AuthResponse, LoginRequest};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Login handler
///
/// # Example Request
///
/// ```http
/// POST /api/auth/login HTTP/1.1
/// Content-Type: application/json
///
/// { "username": "alice", "password": "securepassword123", "deviceId": "phone" }
/// ```
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, BackendError> {
    tracing::info!("[Auth] Login request for: {}", request.username);

    if request.device_id.trim().is_empty() {
        return Err(BackendError::handler(StatusCode::BAD_REQUEST, "deviceId is required"));
    }

    let user = if request.username.contains('@') {
        state.users.get_by_email(&request.username).await?
    } else {
        state.users.get_by_username(&request.username).await?
    };

    let user = user.ok_or_else(|| {
        tracing::warn!("[Auth] User not found: {}", request.username);
        BackendError::unauthorized("Invalid credentials")
    })?;

    let valid = verify(&request.password, &user.password_hash).map_err(|e| {
        tracing::error!("[Auth] Password verification error: {:?}", e);
        BackendError::handler(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
    })?;

    if !valid {
        tracing::warn!("[Auth] Invalid password for user: {}", request.username);
        return Err(BackendError::unauthorized("Invalid credentials"));
    }

    let token = state
        .sessions
        .create_token(user.id, &user.email, &request.device_id)
        .map_err(|e| {
            tracing::error!("[Auth] Failed to create token: {:?}", e);
            BackendError::handler(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        })?;

    tracing::info!("[Auth] User logged in: {} on device {}", user.username, request.device_id);

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}
