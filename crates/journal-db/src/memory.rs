//! In-process store with the same constraints as the PostgreSQL schema
//!
//! Enabled for tests (and for dependents through the `test-util` feature).
//! Name and email are unique, entries require an existing owner, and
//! deleting a user removes their entries under the same lock.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::error::DbError;
use crate::models::{Entry, EntryScope, NewEntry, NewUser, UpdateEntry, UpdateUser, User};
use crate::store::JournalStore;

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    entries: BTreeMap<i64, Entry>,
    next_user_id: i64,
    next_entry_id: i64,
}

impl Tables {
    fn name_or_email_taken(&self, name: &str, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .filter(|u| Some(u.id) != except)
            .any(|u| u.name == name || u.email == email)
    }
}

/// Memory-backed [`JournalStore`]
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored password value of a user, bypassing hashing.
    /// Used to simulate rows written before passwords were hashed.
    pub fn set_raw_password(&self, id: i64, value: &str) -> bool {
        match self.tables.write().users.get_mut(&id) {
            Some(user) => {
                user.password_hash = value.to_string();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl JournalStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let mut tables = self.tables.write();
        if tables.name_or_email_taken(&user.name, &user.email, None) {
            return Err(DbError::Duplicate(format!(
                "User '{}' or email '{}' already exists",
                user.name, user.email
            )));
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let record = User {
            id: tables.next_user_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_user_by_name(&self, name: &str) -> Result<Option<User>, DbError> {
        Ok(self.tables.read().users.values().find(|u| u.name == name).cloned())
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, DbError> {
        Ok(self.tables.read().users.values().cloned().collect())
    }

    async fn update_user(&self, id: i64, update: UpdateUser) -> Result<Option<User>, DbError> {
        let mut tables = self.tables.write();
        let Some(current) = tables.users.get(&id) else {
            return Ok(None);
        };

        let name = update.name.unwrap_or_else(|| current.name.clone());
        let email = update.email.unwrap_or_else(|| current.email.clone());
        if tables.name_or_email_taken(&name, &email, Some(id)) {
            return Err(DbError::Duplicate(format!(
                "Name or email already in use (user {})",
                id
            )));
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        user.name = name;
        user.email = email;
        if let Some(hash) = update.password_hash {
            user.password_hash = hash;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, DbError> {
        let mut tables = self.tables.write();
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.entries.retain(|_, e| e.user_id != id);
        Ok(true)
    }

    async fn insert_entry(&self, user_id: i64, entry: NewEntry) -> Result<Entry, DbError> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&user_id) {
            return Err(DbError::NotFound(format!("User: {}", user_id)));
        }

        tables.next_entry_id += 1;
        let now = Utc::now();
        let record = Entry {
            id: tables.next_entry_id,
            user_id,
            situation: entry.situation,
            text: entry.text,
            colour: entry.colour,
            icon: entry.icon,
            created_at: now,
            updated_at: now,
        };
        tables.entries.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_entries(&self, scope: EntryScope) -> Result<Vec<Entry>, DbError> {
        let mut entries: Vec<Entry> = self
            .tables
            .read()
            .entries
            .values()
            .filter(|e| scope.permits(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    async fn update_entry(
        &self,
        id: i64,
        scope: EntryScope,
        update: UpdateEntry,
    ) -> Result<Option<Entry>, DbError> {
        let mut tables = self.tables.write();
        let Some(entry) = tables.entries.get_mut(&id).filter(|e| scope.permits(e)) else {
            return Ok(None);
        };

        if let Some(situation) = update.situation {
            entry.situation = situation;
        }
        if let Some(text) = update.text {
            entry.text = text;
        }
        if let Some(colour) = update.colour {
            entry.colour = colour;
        }
        if let Some(icon) = update.icon {
            entry.icon = icon;
        }
        entry.updated_at = Utc::now();
        Ok(Some(entry.clone()))
    }

    async fn delete_entry(&self, id: i64, scope: EntryScope) -> Result<bool, DbError> {
        let mut tables = self.tables.write();
        let permitted = tables.entries.get(&id).is_some_and(|e| scope.permits(e));
        if permitted {
            tables.entries.remove(&id);
        }
        Ok(permitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "hash".to_string(),
            role: UserRole::User,
        }
    }

    fn new_entry(label: &str) -> NewEntry {
        NewEntry {
            situation: label.to_string(),
            text: "t".to_string(),
            colour: "c".to_string(),
            icon: "i".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_name_and_email_rejected() {
        let store = MemoryStore::new();
        store.insert_user(new_user("alice")).await.unwrap();

        let same_name = store.insert_user(new_user("alice")).await;
        assert!(matches!(same_name, Err(DbError::Duplicate(_))));

        let mut other = new_user("bob");
        other.email = "alice@example.com".to_string();
        assert!(matches!(store.insert_user(other).await, Err(DbError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_entry_requires_existing_owner() {
        let store = MemoryStore::new();
        let result = store.insert_entry(42, new_entry("s")).await;
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_owner_scope_isolates_users() {
        let store = MemoryStore::new();
        let alice = store.insert_user(new_user("alice")).await.unwrap();
        let bob = store.insert_user(new_user("bob")).await.unwrap();

        let first = store.insert_entry(alice.id, new_entry("first")).await.unwrap();
        let second = store.insert_entry(alice.id, new_entry("second")).await.unwrap();
        let bobs = store.insert_entry(bob.id, new_entry("bob")).await.unwrap();

        let listed = store.list_entries(EntryScope::Owner(alice.id)).await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let update = UpdateEntry {
            text: Some("hijacked".to_string()),
            ..Default::default()
        };
        assert!(
            store
                .update_entry(bobs.id, EntryScope::Owner(alice.id), update)
                .await
                .unwrap()
                .is_none()
        );
        assert!(!store.delete_entry(bobs.id, EntryScope::Owner(alice.id)).await.unwrap());
        assert!(store.delete_entry(bobs.id, EntryScope::Any).await.unwrap());
    }

    #[tokio::test]
    async fn test_partial_entry_update_keeps_other_fields() {
        let store = MemoryStore::new();
        let alice = store.insert_user(new_user("alice")).await.unwrap();
        let entry = store.insert_entry(alice.id, new_entry("s")).await.unwrap();

        let updated = store
            .update_entry(
                entry.id,
                EntryScope::Owner(alice.id),
                UpdateEntry {
                    colour: Some("blue".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.colour, "blue");
        assert_eq!(updated.situation, "s");
        assert_eq!(updated.text, "t");
    }

    #[tokio::test]
    async fn test_delete_user_cascades_entries() {
        let store = MemoryStore::new();
        let alice = store.insert_user(new_user("alice")).await.unwrap();
        let bob = store.insert_user(new_user("bob")).await.unwrap();
        store.insert_entry(alice.id, new_entry("a")).await.unwrap();
        store.insert_entry(alice.id, new_entry("b")).await.unwrap();
        store.insert_entry(bob.id, new_entry("c")).await.unwrap();

        assert!(store.delete_user(alice.id).await.unwrap());
        assert!(store.get_user_by_id(alice.id).await.unwrap().is_none());
        assert!(store.list_entries(EntryScope::Owner(alice.id)).await.unwrap().is_empty());
        assert_eq!(store.list_entries(EntryScope::Any).await.unwrap().len(), 1);

        assert!(!store.delete_user(alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_user_rejects_taken_email() {
        let store = MemoryStore::new();
        let alice = store.insert_user(new_user("alice")).await.unwrap();
        store.insert_user(new_user("bob")).await.unwrap();

        let result = store
            .update_user(
                alice.id,
                UpdateUser {
                    email: Some("bob@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(DbError::Duplicate(_))));

        let renamed = store
            .update_user(
                alice.id,
                UpdateUser {
                    role: Some(UserRole::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.role, UserRole::Admin);
        assert_eq!(renamed.name, "alice");
    }
}
