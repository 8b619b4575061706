//! Entry operations

use crate::error::DbError;
use crate::models::{Entry, EntryScope, NewEntry, UpdateEntry};

use super::Database;

const ENTRY_COLUMNS: &str = "id, user_id, situation, text, colour, icon, created_at, updated_at";

impl Database {
    /// Insert an entry for `user_id`
    pub async fn insert_entry(&self, user_id: i64, entry: NewEntry) -> Result<Entry, DbError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO entries (user_id, situation, text, colour, icon)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&entry.situation)
        .bind(&entry.text)
        .bind(&entry.colour)
        .bind(&entry.icon)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::classify(e, format!("User: {}", user_id)))?;

        Ok(Entry::try_from(&row)?)
    }

    /// List entries in scope, newest first
    pub async fn list_entries(&self, scope: EntryScope) -> Result<Vec<Entry>, DbError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM entries
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(scope.owner())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Entry::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Update the provided fields of an entry in scope
    pub async fn update_entry(
        &self,
        id: i64,
        scope: EntryScope,
        update: UpdateEntry,
    ) -> Result<Option<Entry>, DbError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE entries
            SET situation = COALESCE($1, situation),
                text = COALESCE($2, text),
                colour = COALESCE($3, colour),
                icon = COALESCE($4, icon),
                updated_at = NOW()
            WHERE id = $5 AND ($6::BIGINT IS NULL OR user_id = $6)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(update.situation.as_deref())
        .bind(update.text.as_deref())
        .bind(update.colour.as_deref())
        .bind(update.icon.as_deref())
        .bind(id)
        .bind(scope.owner())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Entry::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Delete an entry in scope
    pub async fn delete_entry(&self, id: i64, scope: EntryScope) -> Result<bool, DbError> {
        let result =
            sqlx::query("DELETE FROM entries WHERE id = $1 AND ($2::BIGINT IS NULL OR user_id = $2)")
                .bind(id)
                .bind(scope.owner())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
