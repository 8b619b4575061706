//! Journal REST API
//!
//! This crate provides the Axum-based HTTP API for the journal backend:
//! registration and login, the caller's own entries, and the
//! administrative views over every user and entry.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, with_request_timeout};
pub use state::{AppState, MetricsHandle};
