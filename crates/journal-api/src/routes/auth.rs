//! Authentication extractors and routes

use axum::{
    Json, Router,
    extract::{FromRef, FromRequestParts, State},
    http::{StatusCode, header::SET_COOKIE, request::Parts},
    response::IntoResponse,
    routing::post,
};
use journal_auth::{
    AuthUser, Registration, authenticate, clear_session_cookie, require_admin, session_cookie,
};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{
    JsonBody, LoginRequest, LoginResponse, MessageResponse, RegisterRequest, UserResponse,
    UsernameResponse,
};

// ==================== Auth Extractors ====================

/// Extractor for authenticated user (required)
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let user = authenticate(&app_state.jwt, &parts.headers)?;
        Ok(RequireAuth(user))
    }
}

/// Extractor for admin user (required)
pub struct RequireAdmin(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        Ok(RequireAdmin(require_admin(user)?))
    }
}

// ==================== Input Validation ====================

/// Maximum allowed name length
pub(crate) const MAX_NAME_LENGTH: usize = 64;
/// Maximum allowed email length
pub(crate) const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum allowed password length
pub(crate) const MAX_PASSWORD_LENGTH: usize = 256;

pub(crate) fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
    }
    if name.trim() != name {
        return Err(ApiError::BadRequest(
            "Name cannot start or end with whitespace".to_string(),
        ));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Name exceeds maximum length of {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Email exceeds maximum length of {} characters",
            MAX_EMAIL_LENGTH
        )));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiError::BadRequest("Invalid email address".to_string())),
    }
}

pub(crate) fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::BadRequest("Password cannot be empty".to_string()));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Login fields must be present; lengths are capped before any hashing work
fn validate_login(name: &str, password: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest(
            "Name and password are required".to_string(),
        ));
    }
    if name.len() > MAX_NAME_LENGTH || password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(
            "Name or password exceeds maximum length".to_string(),
        ));
    }
    Ok(())
}

// ==================== Auth Routes ====================

/// POST /user/create
async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_name(&request.name)?;
    validate_email(&request.email)?;
    validate_password(&request.password)?;

    debug!("Registering user: {}", request.name);

    let user = state
        .auth
        .register(Registration {
            name: request.name,
            email: request.email,
            password: request.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /user/login
async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_login(&request.name, &request.password)?;

    debug!("Login attempt for user: {}", request.name);

    let session = state.auth.login(&request.name, &request.password).await?;
    let cookie = session_cookie(&session.token, session.expires_in, state.cookie_secure);

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            token: session.token,
            username: session.username,
            role: session.role.as_str().to_string(),
            expires_in: session.expires_in,
        }),
    ))
}

/// POST /user/logout
async fn logout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> impl IntoResponse {
    info!("User {} logged out", user.username);
    (
        [(SET_COOKIE, clear_session_cookie(state.cookie_secure))],
        Json(MessageResponse::new("Logged out")),
    )
}

/// POST /user/getusername
async fn get_username(RequireAuth(user): RequireAuth) -> Json<UsernameResponse> {
    Json(UsernameResponse {
        username: user.username,
    })
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/create", post(register))
        .route("/user/login", post(login))
        .route("/user/logout", post(logout))
        .route("/user/getusername", post(get_username))
}
