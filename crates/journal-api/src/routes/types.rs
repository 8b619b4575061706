//! Request/Response DTOs

use axum::extract::{FromRequest, FromRequestParts};
use journal_db::{Entry, User};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ==================== Extractors ====================

/// JSON body whose rejection is reported as an [`ApiError`]
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Path parameters whose rejection is reported as an [`ApiError`]
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct IdPath<T>(pub T);

// ==================== Auth Types ====================

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

/// Login response
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: String,
    pub expires_in: i64,
}

/// Registration request. A `role` field, if sent, is ignored.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Username lookup response
#[derive(Serialize)]
pub struct UsernameResponse {
    pub username: String,
}

/// Plain acknowledgement
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ==================== User Types ====================

/// Admin user update; omitted fields keep their value
#[derive(Deserialize, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

/// User response (without password)
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role.as_str().to_string(),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

// ==================== Entry Types ====================

/// Create entry request
#[derive(Deserialize)]
pub struct CreateEntryRequest {
    #[serde(default)]
    pub situation: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub colour: String,
    #[serde(default)]
    pub icon: String,
}

/// Update entry request; omitted fields keep their value
#[derive(Deserialize, Default)]
pub struct UpdateEntryRequest {
    pub situation: Option<String>,
    pub text: Option<String>,
    pub colour: Option<String>,
    pub icon: Option<String>,
}

/// Entry response
#[derive(Serialize)]
pub struct EntryResponse {
    pub id: i64,
    pub user_id: i64,
    pub situation: String,
    pub text: String,
    pub colour: String,
    pub icon: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Entry> for EntryResponse {
    fn from(entry: Entry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            situation: entry.situation,
            text: entry.text,
            colour: entry.colour,
            icon: entry.icon,
            created_at: entry.created_at.to_rfc3339(),
            updated_at: entry.updated_at.to_rfc3339(),
        }
    }
}
