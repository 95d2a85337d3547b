/**
 * Authentication Handler Types
 *
 * Request and response bodies shared by signup, login and get_me.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::auth::users::User;

/// Sign up request
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    /// User's chosen username (3-30 chars, alphanumeric + underscore)
    pub username: String,
    pub email: String,
    /// Hashed before storage
    pub password: String,
    /// Initial display name; defaults to the username
    #[serde(default)]
    pub display_name: Option<String>,
    /// Device the session is issued to
    pub device_id: String,
}

/// Login request
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username, or email when it contains '@'
    pub username: String,
    pub password: String,
    pub device_id: String,
}

/// Auth response
///
/// Returned by signup and login handlers.
#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    /// JWT token for authentication
    pub token: String,
    pub user: UserResponse,
}

/// User response (without sensitive data)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}
