//! Common test utilities and helpers
//!
//! Builds the full router over in-memory storage and drives it with
//! `tower::ServiceExt::oneshot`, so the HTTP tests need no database or port.

#![allow(dead_code)]

pub mod store_contract;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use splitsync::backend::notifications::NoopPushSender;
use splitsync::backend::routes::create_router;
use splitsync::backend::server::{AppState, ServerConfig};
use splitsync::backend::storage::Repositories;

pub const TEST_SECRET: &str = "test-secret-for-integration-tests";

/// Configuration for tests: memory storage, no push, cheap hashing
pub fn test_config() -> ServerConfig {
    ServerConfig {
        jwt_secret: TEST_SECRET.to_string(),
        push_provider: "none".to_string(),
        bcrypt_cost: 4,
        ..ServerConfig::default()
    }
}

/// State over the given repositories
pub fn test_state(repositories: Repositories) -> AppState {
    AppState::new(test_config(), repositories, Arc::new(NoopPushSender))
}

pub fn test_app() -> Router {
    create_router(test_state(Repositories::in_memory()))
}

/// Response status and parsed JSON body (`Value::Null` when empty or not JSON)
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, auth_header(token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse { status, body }
}

/// Create authorization header value
pub fn auth_header(token: &str) -> String {
    format!("Bearer {}", token)
}

/// A signed-up user with a session on one device
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

pub async fn signup(app: &Router, username: &str, device_id: &str) -> TestUser {
    let response = send(
        app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "password123",
            "displayName": capitalize(username),
            "deviceId": device_id,
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "signup failed: {}", response.body);

    TestUser {
        id: response.body["user"]["id"].as_str().unwrap().parse().unwrap(),
        username: username.to_string(),
        token: response.body["token"].as_str().unwrap().to_string(),
    }
}

/// Log the user in on another device
pub async fn login(app: &Router, username: &str, device_id: &str) -> String {
    let response = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({
            "username": username,
            "password": "password123",
            "deviceId": device_id,
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
    response.body["token"].as_str().unwrap().to_string()
}

pub async fn push(app: &Router, token: &str, operations: Vec<Value>) -> TestResponse {
    send(
        app,
        Method::POST,
        "/api/operations/push",
        Some(token),
        Some(json!({ "operations": operations })),
    )
    .await
}

pub async fn pull(app: &Router, token: &str, channel: &str) -> Vec<Value> {
    let uri = format!("/api/operations?type={}", channel);
    let response = send(app, Method::GET, &uri, Some(token), None).await;
    assert_eq!(response.status, StatusCode::OK, "pull failed: {}", response.body);
    response.body["operations"].as_array().cloned().unwrap_or_default()
}

pub async fn confirm(app: &Router, token: &str, operation_ids: &[Value]) -> TestResponse {
    send(
        app,
        Method::POST,
        "/api/operations/confirm",
        Some(token),
        Some(json!({ "operationIds": operation_ids })),
    )
    .await
}

/// Pull everything on the regular channel and confirm it
pub async fn drain(app: &Router, token: &str) -> Vec<Value> {
    let operations = pull(app, token, "regular").await;
    let ids: Vec<Value> = operations.iter().map(|op| op["operationId"].clone()).collect();
    if !ids.is_empty() {
        assert_eq!(confirm(app, token, &ids).await.status, StatusCode::OK);
    }
    operations
}

/// Wire operation with a fresh id
pub fn operation(created_at: i64, payload: Value) -> Value {
    json!({
        "operationId": Uuid::new_v4(),
        "createdAt": created_at,
        "payload": payload,
    })
}

pub fn create_group(group_id: Uuid, name: &str, participants: &[Uuid]) -> Value {
    json!({ "createSpendingGroup": { "groupId": group_id, "name": name, "participants": participants } })
}

pub fn create_spending(group_id: Uuid, name: &str, payer: Uuid) -> Value {
    json!({
        "createSpending": {
            "spendingId": Uuid::new_v4(),
            "groupId": group_id,
            "name": name,
            "amount": 1250,
            "currency": "EUR",
            "payerId": payer,
        }
    })
}

pub fn rename(user_id: Uuid, display_name: &str) -> Value {
    json!({ "updateDisplayName": { "userId": user_id, "displayName": display_name } })
}

pub fn payload_kind(operation: &Value) -> String {
    operation["payload"]
        .as_object()
        .and_then(|payload| payload.keys().next().cloned())
        .unwrap_or_default()
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
