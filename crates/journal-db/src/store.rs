//! Store trait shared by every persistence backend

use async_trait::async_trait;

use crate::error::DbError;
use crate::models::{Entry, EntryScope, NewEntry, NewUser, UpdateEntry, UpdateUser, User};

/// Persistence operations for users and their journal entries.
///
/// Entry reads and writes always carry an [`EntryScope`]; an operation
/// scoped to an owner never sees rows belonging to anyone else.
#[async_trait]
pub trait JournalStore: Send + Sync {
    // ==================== Users ====================

    /// Insert a new user. Fails with `Duplicate` if the name or email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, DbError>;

    async fn get_user_by_name(&self, name: &str) -> Result<Option<User>, DbError>;

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError>;

    async fn list_users(&self) -> Result<Vec<User>, DbError>;

    /// Apply a partial update. Returns `None` if the user does not exist.
    async fn update_user(&self, id: i64, update: UpdateUser) -> Result<Option<User>, DbError>;

    /// Delete a user together with all of their entries, atomically.
    async fn delete_user(&self, id: i64) -> Result<bool, DbError>;

    // ==================== Entries ====================

    /// Insert an entry owned by `user_id`. Fails with `NotFound` if the
    /// owner does not exist.
    async fn insert_entry(&self, user_id: i64, entry: NewEntry) -> Result<Entry, DbError>;

    /// List entries visible in `scope`, newest first.
    async fn list_entries(&self, scope: EntryScope) -> Result<Vec<Entry>, DbError>;

    /// Apply a partial update to an entry visible in `scope`.
    async fn update_entry(
        &self,
        id: i64,
        scope: EntryScope,
        update: UpdateEntry,
    ) -> Result<Option<Entry>, DbError>;

    /// Delete an entry visible in `scope`.
    async fn delete_entry(&self, id: i64, scope: EntryScope) -> Result<bool, DbError>;
}
