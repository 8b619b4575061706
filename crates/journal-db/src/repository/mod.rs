//! PostgreSQL repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::time::Duration;
use tracing::info;

use crate::error::DbError;
use crate::models::{Entry, EntryScope, NewEntry, NewUser, UpdateEntry, UpdateUser, User};
use crate::store::JournalStore;

// Submodules
mod entries;
mod users;

/// Connection settings for the PostgreSQL pool
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    /// libpq-style sslmode (`disable`, `prefer`, `require`, ...)
    pub ssl_mode: String,
    pub max_connections: u32,
    /// Upper bound on waiting for a pooled connection
    pub acquire_timeout: Duration,
}

/// Database connection and operations
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and make sure the schema exists
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, DbError> {
        info!(
            "Connecting to database {} at {}:{}",
            settings.database, settings.host, settings.port
        );

        let ssl_mode: PgSslMode = settings.ssl_mode.parse()?;
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.username)
            .password(&settings.password)
            .database(&settings.database)
            .ssl_mode(ssl_mode);

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Create tables and indexes if they don't exist
    async fn run_migrations(&self) -> Result<(), DbError> {
        info!("Running database migrations");

        const STATEMENTS: [&str; 3] = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                situation TEXT NOT NULL,
                text TEXT NOT NULL,
                colour TEXT NOT NULL,
                icon TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_entries_user_created
            ON entries(user_id, created_at DESC)
            "#,
        ];

        for statement in STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DbError::Migration(e.to_string()))?;
        }

        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl JournalStore for Database {
    async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        Database::insert_user(self, user).await
    }

    async fn get_user_by_name(&self, name: &str) -> Result<Option<User>, DbError> {
        Database::get_user_by_name(self, name).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        Database::get_user_by_id(self, id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, DbError> {
        Database::list_users(self).await
    }

    async fn update_user(&self, id: i64, update: UpdateUser) -> Result<Option<User>, DbError> {
        Database::update_user(self, id, update).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool, DbError> {
        Database::delete_user(self, id).await
    }

    async fn insert_entry(&self, user_id: i64, entry: NewEntry) -> Result<Entry, DbError> {
        Database::insert_entry(self, user_id, entry).await
    }

    async fn list_entries(&self, scope: EntryScope) -> Result<Vec<Entry>, DbError> {
        Database::list_entries(self, scope).await
    }

    async fn update_entry(
        &self,
        id: i64,
        scope: EntryScope,
        update: UpdateEntry,
    ) -> Result<Option<Entry>, DbError> {
        Database::update_entry(self, id, scope, update).await
    }

    async fn delete_entry(&self, id: i64, scope: EntryScope) -> Result<bool, DbError> {
        Database::delete_entry(self, id, scope).await
    }
}
