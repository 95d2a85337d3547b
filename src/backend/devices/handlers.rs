/**
 * Device Handlers
 */
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::backend::error::BackendError;
use crate::backend::middleware::auth::AuthUser;
use crate::backend::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PushTokenRequest {
    pub token: String,
}

/// Register the calling device's push token (PUT /api/devices/push-token)
pub async fn register_push_token(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<PushTokenRequest>,
) -> Result<StatusCode, BackendError> {
    let token = request.token.trim();
    if token.is_empty() {
        return Err(BackendError::handler(StatusCode::BAD_REQUEST, "token must not be empty"));
    }

    state
        .devices
        .set_push_token(user.user_id, &user.device_id, token)
        .await?;

    tracing::info!(
        "[Push] Registered token for device {} of user {}",
        user.device_id,
        user.user_id
    );
    Ok(StatusCode::NO_CONTENT)
}
