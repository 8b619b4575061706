//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::postgres::PgRow;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    InvalidUserRole(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidUserRole(s) => write!(f, "Invalid user role: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// User role
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Interpret a role column value.
    ///
    /// Rows written before roles existed carry an empty string; those, and
    /// anything unrecognised, read as a plain user.
    pub fn from_stored(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for UserRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            _ => Err(ParseError::InvalidUserRole(s.to_string())),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Update user (for partial updates)
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
}

/// Journal entry model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Short label describing the situation
    pub situation: String,
    pub text: String,
    pub colour: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New entry (for insertion); the owner is passed separately
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub situation: String,
    pub text: String,
    pub colour: String,
    pub icon: String,
}

/// Update entry (for partial updates)
#[derive(Debug, Clone, Default)]
pub struct UpdateEntry {
    pub situation: Option<String>,
    pub text: Option<String>,
    pub colour: Option<String>,
    pub icon: Option<String>,
}

/// Which entries an operation may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryScope {
    /// Only entries owned by this user id
    Owner(i64),
    /// Every entry (administrative access)
    Any,
}

impl EntryScope {
    /// Owner filter, if the scope has one
    pub fn owner(&self) -> Option<i64> {
        match self {
            EntryScope::Owner(id) => Some(*id),
            EntryScope::Any => None,
        }
    }

    pub fn permits(&self, entry: &Entry) -> bool {
        match self {
            EntryScope::Owner(id) => entry.user_id == *id,
            EntryScope::Any => true,
        }
    }
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&PgRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &PgRow) -> Result<Self, Self::Error> {
        let role_str: String = row.try_get("role")?;
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role: UserRole::from_stored(&role_str),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<&PgRow> for Entry {
    type Error = sqlx::Error;

    fn try_from(row: &PgRow) -> Result<Self, Self::Error> {
        Ok(Entry {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            situation: row.try_get("situation")?,
            text: row.try_get("text")?,
            colour: row.try_get("colour")?,
            icon: row.try_get("icon")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_owned_by(user_id: i64) -> Entry {
        let now = Utc::now();
        Entry {
            id: 1,
            user_id,
            situation: "s".to_string(),
            text: "t".to_string(),
            colour: "c".to_string(),
            icon: "i".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_user_role_parsing() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("user".parse::<UserRole>().unwrap(), UserRole::User);
        assert!("Admin".parse::<UserRole>().is_err());
        assert!("read-only".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_stored_role_defaults_to_user() {
        assert_eq!(UserRole::from_stored(""), UserRole::User);
        assert_eq!(UserRole::from_stored("superuser"), UserRole::User);
        assert_eq!(UserRole::from_stored("admin"), UserRole::Admin);
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let now = Utc::now();
        let user = User {
            id: 7,
            name: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_entry_scope() {
        let entry = entry_owned_by(3);
        assert!(EntryScope::Owner(3).permits(&entry));
        assert!(!EntryScope::Owner(4).permits(&entry));
        assert!(EntryScope::Any.permits(&entry));
        assert_eq!(EntryScope::Owner(3).owner(), Some(3));
        assert_eq!(EntryScope::Any.owner(), None);
    }
}
