/**
 * Get Current User Handler
 *
 * GET /api/auth/me, behind the auth middleware.
 */
use axum::{extract::State, http::StatusCode, response::Json};

use crate::backend::auth::handlers::types::UserResponse;
use crate::backend::error::BackendError;
use crate::backend::middleware::auth::AuthUser;
use crate::backend::server::state::AppState;

pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<UserResponse>, BackendError> {
    let user = state
        .users
        .get_by_id(caller.user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("[Auth] User not found: {}", caller.user_id);
            BackendError::handler(StatusCode::NOT_FOUND, "User not found")
        })?;

    Ok(Json(user.into()))
}
