//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::errors::ErrorKind;
use journal_db::DbError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    TokenExpired,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Name '{0}' is reserved")]
    ReservedName(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("JWT error: {0}")]
    Jwt(jsonwebtoken::errors::Error),

    #[error("Store error: {0}")]
    Store(#[from] DbError),
}

impl AuthError {
    /// Classify a failure from `jsonwebtoken::decode`
    pub(crate) fn from_decode(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName => AuthError::InvalidSignature,
            _ => AuthError::InvalidToken,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::ReservedName(_) => StatusCode::BAD_REQUEST,
            AuthError::PasswordHash(_) | AuthError::Jwt(_) | AuthError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AuthError::MissingToken => "Unauthorized: Missing token".to_string(),
            AuthError::InvalidSignature => "Invalid token".to_string(),
            AuthError::InsufficientPermissions => "Forbidden: Admin access required".to_string(),
            AuthError::PasswordHash(_) | AuthError::Jwt(_) | AuthError::Store(_) => {
                tracing::error!("Authentication failure: {}", self);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = axum::Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
