//! Administrative routes over every user and entry

use axum::{
    Json, Router,
    extract::State,
    routing::{get, put},
};
use journal_auth::Authenticator;
use journal_db::{EntryScope, UpdateUser, UserRole};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::{RequireAdmin, validate_email, validate_name, validate_password};
use super::entries::{delete_scoped, update_scoped};
use super::types::{
    EntryResponse, IdPath, JsonBody, MessageResponse, UpdateEntryRequest, UpdateUserRequest,
    UserResponse,
};

// ==================== Entry Routes ====================

/// GET /admin/entries
async fn list_entries(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<EntryResponse>>, ApiError> {
    let entries = state.store.list_entries(EntryScope::Any).await?;
    Ok(Json(entries.into_iter().map(EntryResponse::from).collect()))
}

/// PUT /admin/entries/{id}
async fn update_entry(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    IdPath(id): IdPath<i64>,
    JsonBody(request): JsonBody<UpdateEntryRequest>,
) -> Result<Json<EntryResponse>, ApiError> {
    debug!("Admin {} updating entry {}", admin.username, id);
    Ok(Json(update_scoped(&state, id, EntryScope::Any, request).await?))
}

/// DELETE /admin/entries/{id}
async fn delete_entry(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    IdPath(id): IdPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    debug!("Admin {} deleting entry {}", admin.username, id);
    Ok(Json(delete_scoped(&state, id, EntryScope::Any).await?))
}

// ==================== User Routes ====================

/// GET /admin/users
async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.store.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// PUT /admin/users/{id}
async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    IdPath(id): IdPath<i64>,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!("Admin {} updating user {}", admin.username, id);

    if let Some(name) = &request.name {
        validate_name(name)?;
        if Authenticator::is_reserved_name(name) {
            return Err(ApiError::BadRequest(format!("Name '{}' is reserved", name)));
        }
    }
    if let Some(email) = &request.email {
        validate_email(email)?;
    }

    let role = request
        .role
        .as_deref()
        .map(str::parse::<UserRole>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let password_hash = match &request.password {
        Some(password) => {
            validate_password(password)?;
            Some(state.auth.verifier().hash(password)?)
        }
        None => None,
    };

    let user = state
        .store
        .update_user(
            id,
            UpdateUser {
                name: request.name,
                email: request.email,
                password_hash,
                role,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    info!("Updated user: {}", user.name);
    Ok(Json(user.into()))
}

/// DELETE /admin/users/{id}
async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    IdPath(id): IdPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    debug!("Admin {} deleting user {}", admin.username, id);

    if !state.store.delete_user(id).await? {
        return Err(ApiError::NotFound(format!("User: {}", id)));
    }

    info!("Deleted user {} and their entries", id);
    Ok(Json(MessageResponse::new("User deleted")))
}

/// Create admin routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/entries", get(list_entries))
        .route("/admin/entries/{id}", put(update_entry).delete(delete_entry))
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}", put(update_user).delete(delete_user))
}
