//! The caller's own entries

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use journal_db::{EntryScope, NewEntry, UpdateEntry};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequireAuth;
use super::types::{
    CreateEntryRequest, EntryResponse, IdPath, JsonBody, MessageResponse, UpdateEntryRequest,
};

/// Reject empty values for every field that is present
fn non_empty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("Field '{}' is required", field)));
    }
    Ok(())
}

pub(crate) fn validate_new_entry(request: CreateEntryRequest) -> Result<NewEntry, ApiError> {
    non_empty("situation", &request.situation)?;
    non_empty("text", &request.text)?;
    non_empty("colour", &request.colour)?;
    non_empty("icon", &request.icon)?;

    Ok(NewEntry {
        situation: request.situation,
        text: request.text,
        colour: request.colour,
        icon: request.icon,
    })
}

pub(crate) fn validate_entry_update(request: UpdateEntryRequest) -> Result<UpdateEntry, ApiError> {
    let fields = [
        ("situation", &request.situation),
        ("text", &request.text),
        ("colour", &request.colour),
        ("icon", &request.icon),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            non_empty(field, value)?;
        }
    }

    Ok(UpdateEntry {
        situation: request.situation,
        text: request.text,
        colour: request.colour,
        icon: request.icon,
    })
}

/// Update an entry within `scope`, shared with the admin routes
pub(crate) async fn update_scoped(
    state: &AppState,
    id: i64,
    scope: EntryScope,
    request: UpdateEntryRequest,
) -> Result<EntryResponse, ApiError> {
    let update = validate_entry_update(request)?;
    let entry = state
        .store
        .update_entry(id, scope, update)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Entry: {}", id)))?;

    info!("Updated entry {}", entry.id);
    Ok(entry.into())
}

/// Delete an entry within `scope`, shared with the admin routes
pub(crate) async fn delete_scoped(
    state: &AppState,
    id: i64,
    scope: EntryScope,
) -> Result<MessageResponse, ApiError> {
    if !state.store.delete_entry(id, scope).await? {
        return Err(ApiError::NotFound(format!("Entry: {}", id)));
    }

    info!("Deleted entry {}", id);
    Ok(MessageResponse::new("Entry deleted"))
}

// ==================== Entry Routes ====================

/// GET /user/entries
async fn list_entries(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<EntryResponse>>, ApiError> {
    let entries = state.store.list_entries(EntryScope::Owner(user.id)).await?;
    debug!("Listing {} entries for {}", entries.len(), user.username);

    Ok(Json(entries.into_iter().map(EntryResponse::from).collect()))
}

/// POST /user/entries
async fn create_entry(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(request): JsonBody<CreateEntryRequest>,
) -> Result<(StatusCode, Json<EntryResponse>), ApiError> {
    let entry = validate_new_entry(request)?;
    let entry = state.store.insert_entry(user.id, entry).await?;

    metrics::counter!("journal_entries_created_total").increment(1);
    info!("User {} created entry {}", user.username, entry.id);

    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// PUT /user/entries/{id}
async fn update_entry(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(id): IdPath<i64>,
    JsonBody(request): JsonBody<UpdateEntryRequest>,
) -> Result<Json<EntryResponse>, ApiError> {
    let entry = update_scoped(&state, id, EntryScope::Owner(user.id), request).await?;
    Ok(Json(entry))
}

/// DELETE /user/entries/{id}
async fn delete_entry(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(id): IdPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = delete_scoped(&state, id, EntryScope::Owner(user.id)).await?;
    Ok(Json(message))
}

/// Create entry routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/entries", get(list_entries).post(create_entry))
        .route("/user/entries/{id}", put(update_entry).delete(delete_entry))
}
