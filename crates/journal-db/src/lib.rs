//! Journal Database Layer
//!
//! This crate provides the persistence layer for the journal backend:
//! the user/entry models, the [`JournalStore`] trait every handler talks to,
//! and its PostgreSQL implementation built on sqlx.

pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod models;
pub mod repository;
pub mod store;

pub use error::DbError;
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryStore;
pub use models::*;
pub use repository::{Database, DatabaseSettings};
pub use store::JournalStore;

/// Re-export sqlx types for convenience
pub use sqlx::PgPool;
