/**
 * Sync Handlers
 *
 * HTTP surface of the sync engine. Every route is behind the auth
 * middleware; the author of pushed operations and the device that pulls or
 * confirms are always taken from the session.
 */
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::backend::error::BackendError;
use crate::backend::middleware::auth::AuthUser;
use crate::backend::sync::SyncController;
use crate::shared::operations::{
    ConfirmOperationsRequest, ConfirmOperationsResponse, OperationType, PullOperationsResponse,
    PushOperationsRequest, PushOperationsResponse, SearchUsersResponse,
};

/// `type` stays a string so a bad channel name goes through `BackendError`
#[derive(Debug, Deserialize)]
pub struct PullQuery {
    #[serde(rename = "type")]
    pub operation_type: Option<String>,
}

impl PullQuery {
    pub fn channel(&self) -> Result<OperationType, BackendError> {
        match self.operation_type.as_deref() {
            None => Ok(OperationType::default()),
            Some(name) => Ok(name.parse::<OperationType>()?),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

/// POST /api/operations/push
pub async fn push_operations(
    State(sync): State<SyncController>,
    AuthUser(user): AuthUser,
    Json(request): Json<PushOperationsRequest>,
) -> Result<Json<PushOperationsResponse>, BackendError> {
    let accepted = sync
        .push(request.operations, user.user_id, &user.device_id)
        .await
        .map_err(|e| {
            tracing::warn!("[Sync] Push from user {} rejected: {}", user.user_id, e);
            e
        })?;

    Ok(Json(PushOperationsResponse { accepted }))
}

/// GET /api/operations?type=regular|large
pub async fn pull_operations(
    State(sync): State<SyncController>,
    AuthUser(user): AuthUser,
    Query(query): Query<PullQuery>,
) -> Result<Json<PullOperationsResponse>, BackendError> {
    let operations = sync
        .pull(user.user_id, &user.device_id, query.channel()?)
        .await?;

    Ok(Json(PullOperationsResponse { operations }))
}

/// POST /api/operations/confirm
pub async fn confirm_operations(
    State(sync): State<SyncController>,
    AuthUser(user): AuthUser,
    Json(request): Json<ConfirmOperationsRequest>,
) -> Result<Json<ConfirmOperationsResponse>, BackendError> {
    let confirmed = sync
        .confirm(&request.operation_ids, user.user_id, &user.device_id)
        .await?;

    Ok(Json(ConfirmOperationsResponse { confirmed }))
}

/// GET /api/users/search?query=
pub async fn search_users(
    State(sync): State<SyncController>,
    AuthUser(_user): AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchUsersResponse>, BackendError> {
    let users = sync.search_users(&query.query).await?;
    Ok(Json(SearchUsersResponse { users }))
}
