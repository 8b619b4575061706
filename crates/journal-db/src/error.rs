//! Database error types

use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

impl DbError {
    /// Map constraint violations onto the domain variants.
    ///
    /// `subject` names the row the constraint refers to: the conflicting
    /// value for unique violations, the missing parent for foreign keys.
    pub(crate) fn classify(err: sqlx::Error, subject: impl Into<String>) -> Self {
        let kind = err.as_database_error().map(|e| e.kind());
        match kind {
            Some(ErrorKind::UniqueViolation) => DbError::Duplicate(subject.into()),
            Some(ErrorKind::ForeignKeyViolation) => DbError::NotFound(subject.into()),
            _ => DbError::Connection(err),
        }
    }
}
