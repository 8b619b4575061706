//! Request guard: token extraction and role checks

use axum::http::{
    HeaderMap,
    header::{AUTHORIZATION, COOKIE},
};
use journal_db::UserRole;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;
use crate::jwt::{Claims, JwtManager};

/// Cookie carrying the session token when no Authorization header is sent
pub const TOKEN_COOKIE: &str = "token";

/// Authenticated user information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
}

impl AuthUser {
    /// Create from JWT claims
    pub fn from_claims(claims: &Claims) -> Result<Self, AuthError> {
        Ok(Self {
            id: claims.sub.parse().map_err(|_| AuthError::InvalidToken)?,
            username: claims.username.clone(),
            role: claims.role,
        })
    }
}

/// Extract bearer token from authorization header; the scheme is case-insensitive
fn extract_bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    Some(token.trim()).filter(|token| !token.is_empty())
}

/// Find a cookie by name across all Cookie headers
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Token from `Authorization: Bearer`, falling back to the session cookie
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .or_else(|| cookie_value(headers, TOKEN_COOKIE))
}

/// Resolve the caller from request headers
pub fn authenticate(jwt: &JwtManager, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
    let token = extract_token(headers).ok_or(AuthError::MissingToken)?;
    let claims = jwt.validate_token(token)?;
    let user = AuthUser::from_claims(&claims)?;

    debug!("Authenticated user: {} ({})", user.username, user.role.as_str());
    Ok(user)
}

/// Require the admin role
pub fn require_admin(user: AuthUser) -> Result<AuthUser, AuthError> {
    if !user.role.is_admin() {
        debug!("User {} denied admin access", user.username);
        return Err(AuthError::InsufficientPermissions);
    }
    Ok(user)
}

/// `Set-Cookie` value carrying a session token
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        TOKEN_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}
