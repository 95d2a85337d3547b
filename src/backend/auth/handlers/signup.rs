/**
 * Signup Handler
 *
 * POST /api/auth/signup
 *
 * # Registration Process
 *
 * 1. Validate username, email, password and device id
 * 2. Hash password using bcrypt
 * 3. Store credentials
 * 4. Append the server-authored `CreateUser` operation to the sync log
 * 5. Issue a session for the signing-up device
 *
 * Steps 3 and 4 write to two independent repositories. If step 4 fails the
 * credentials are rolled back, so a retry with the same username succeeds.
 */
use axum::{extract::State, http::StatusCode, response::Json};
use bcrypt::hash;
use uuid::Uuid;

use crate::backend::auth::handlers::types::{AuthResponse, SignupRequest};
use crate::backend::auth::users::User;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::operations::{CreateUser, Operation, OperationPayload};

/// Validate username format
///
/// Usernames must be:
/// - 3-30 characters long
/// - Contain only alphanumeric characters and underscores
/// - Start with a letter
pub(crate) fn is_valid_username(username: &str) -> bool {
    if username.len() < 3 || username.len() > 30 {
        return false;
    }

    let mut chars = username.chars();

    // First character must be a letter
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }

    // Rest can be alphanumeric or underscore
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate(request: &SignupRequest) -> Result<(), BackendError> {
    if !is_valid_username(&request.username) {
        tracing::warn!("[Auth] Invalid username format: {}", request.username);
        return Err(BackendError::handler(
            StatusCode::BAD_REQUEST,
            "Username must be 3-30 chars, start with a letter, and contain only letters, numbers, and underscores",
        ));
    }

    if !request.email.contains('@') {
        tracing::warn!("[Auth] Invalid email format: {}", request.email);
        return Err(BackendError::handler(StatusCode::BAD_REQUEST, "Invalid email format"));
    }

    if request.password.len() < 8 {
        tracing::warn!("[Auth] Password too short");
        return Err(BackendError::handler(
            StatusCode::BAD_REQUEST,
            "Password must be at least 8 characters",
        ));
    }

    if request.device_id.trim().is_empty() {
        return Err(BackendError::handler(StatusCode::BAD_REQUEST, "deviceId is required"));
    }

    Ok(())
}

/// Sign up handler
///
/// # Errors
///
/// * `400 Bad Request` - Invalid username, email, password or device id
/// * `409 Conflict` - Username or email already taken
/// * `500 Internal Server Error` - Hashing, storage or token generation failed
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), BackendError> {
    tracing::info!(
        "[Auth] Signup request for username: {}, email: {}",
        request.username,
        request.email
    );
    validate(&request)?;

    let password_hash = hash(&request.password, state.config.bcrypt_cost).map_err(|e| {
        tracing::error!("[Auth] Failed to hash password: {:?}", e);
        BackendError::handler(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
    })?;

    let user = User::new(request.username.clone(), request.email.clone(), password_hash);
    let credentials = state.users.create(user.clone());
    credentials.perform().await.map_err(|e| {
        tracing::warn!("[Auth] Could not store credentials for {}: {}", user.username, e);
        e
    })?;

    let display_name = request
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(user.username.as_str())
        .to_string();
    let create_user = Operation::new(
        Uuid::new_v4(),
        chrono::Utc::now().timestamp_millis(),
        user.id,
        OperationPayload::CreateUser(CreateUser {
            user_id: user.id,
            display_name,
        }),
    );

    if let Err(e) = state
        .sync
        .append_server_operation(create_user, &request.device_id)
        .perform()
        .await
    {
        tracing::error!("[Auth] Failed to append CreateUser for {}: {}", user.id, e);
        if let Err(rollback_err) = credentials.rollback().await {
            tracing::error!(
                "[Auth] Failed to roll back credentials of {}: {}",
                user.id,
                rollback_err
            );
        }
        return Err(e.into());
    }

    let token = state
        .sessions
        .create_token(user.id, &user.email, &request.device_id)
        .map_err(|e| {
            tracing::error!("[Auth] Failed to create token: {:?}", e);
            BackendError::handler(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        })?;

    tracing::info!("[Auth] User created: {} ({})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}
