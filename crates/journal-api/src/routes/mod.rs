//! API routes

mod admin;
mod auth;
mod entries;
mod health;
pub mod metrics;
pub mod types;

use axum::{
    Router,
    http::{StatusCode, header::CONTENT_TYPE},
    middleware,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

use crate::error::ApiError;
use crate::state::{AppState, MetricsHandle};

pub use auth::{RequireAdmin, RequireAuth};

async fn not_found() -> ApiError {
    ApiError::NotFound("Route".to_string())
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(entries::routes())
        .merge(admin::routes())
        .with_state(state);

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
}

/// Bound every request by `timeout`; an expired request gets a JSON 408
pub fn with_request_timeout(router: Router, timeout: Duration) -> Router {
    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(middleware::map_response(timeout_body))
}

/// The timeout layer answers with an empty body
async fn timeout_body(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT
        && !response.headers().contains_key(CONTENT_TYPE)
    {
        return ApiError::Timeout.into_response();
    }
    response
}
