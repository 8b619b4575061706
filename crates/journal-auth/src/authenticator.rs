//! Login and registration

use journal_db::{JournalStore, NewUser, UpdateUser, User, UserRole};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::jwt::JwtManager;
use crate::password::PasswordVerifier;

/// Name reserved for the configured bootstrap administrator (case-insensitive)
pub const RESERVED_ADMIN_NAME: &str = "admin";

/// User id carried by bootstrap administrator tokens. Store ids start at 1.
pub const ADMIN_SENTINEL_ID: i64 = 0;

/// Settings for the login flow
#[derive(Debug, Clone, Default)]
pub struct AuthenticatorSettings {
    /// Secret for the bootstrap administrator; `None` or empty disables it
    pub admin_password: Option<String>,
    /// Accept a plaintext stored password once and replace it with a hash
    pub legacy_plaintext_upgrade: bool,
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
    pub expires_in: i64,
}

/// Registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub struct Authenticator {
    store: Arc<dyn JournalStore>,
    jwt: Arc<JwtManager>,
    verifier: Arc<dyn PasswordVerifier>,
    settings: AuthenticatorSettings,
    /// Verified against when the user does not exist, so both paths cost the same
    dummy_hash: String,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn JournalStore>,
        jwt: Arc<JwtManager>,
        verifier: Arc<dyn PasswordVerifier>,
        settings: AuthenticatorSettings,
    ) -> Result<Self, AuthError> {
        let dummy_hash = verifier.hash("timing-equalization")?;
        if settings.admin_password.as_deref().is_none_or(str::is_empty) {
            warn!("No admin password configured; bootstrap administrator login is disabled");
        }
        Ok(Self {
            store,
            jwt,
            verifier,
            settings,
            dummy_hash,
        })
    }

    pub fn is_reserved_name(name: &str) -> bool {
        name.trim().eq_ignore_ascii_case(RESERVED_ADMIN_NAME)
    }

    pub fn verifier(&self) -> &dyn PasswordVerifier {
        self.verifier.as_ref()
    }

    /// Authenticate by name and password and issue a token
    pub async fn login(&self, name: &str, password: &str) -> Result<Session, AuthError> {
        let result = self.attempt_login(name, password).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(AuthError::InvalidCredentials) => "invalid_credentials",
            Err(_) => "error",
        };
        metrics::counter!("journal_logins_total", "outcome" => outcome).increment(1);

        result
    }

    async fn attempt_login(&self, name: &str, password: &str) -> Result<Session, AuthError> {
        if Self::is_reserved_name(name) {
            return self.bootstrap_login(password);
        }

        let Some(user) = self.store.get_user_by_name(name).await? else {
            let _ = self.verifier.verify(password, &self.dummy_hash);
            debug!("Login failed: unknown user {}", name);
            return Err(AuthError::InvalidCredentials);
        };

        self.check_password(&user, password).await?;

        info!("User {} logged in successfully", user.name);
        self.issue(user.id, &user.name, user.role)
    }

    fn bootstrap_login(&self, password: &str) -> Result<Session, AuthError> {
        match self.settings.admin_password.as_deref() {
            Some(secret)
                if !secret.is_empty() && constant_time_eq(secret.as_bytes(), password.as_bytes()) =>
            {
                info!("Bootstrap administrator logged in");
                self.issue(ADMIN_SENTINEL_ID, RESERVED_ADMIN_NAME, UserRole::Admin)
            }
            _ => {
                warn!("Rejected login for reserved administrator name");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    async fn check_password(&self, user: &User, password: &str) -> Result<(), AuthError> {
        if self.verifier.is_hash(&user.password_hash) {
            return if self.verifier.verify(password, &user.password_hash)? {
                Ok(())
            } else {
                debug!("Login failed: wrong password for {}", user.name);
                Err(AuthError::InvalidCredentials)
            };
        }

        // An empty stored or submitted value never matches
        let plaintext_match = self.settings.legacy_plaintext_upgrade
            && !password.is_empty()
            && !user.password_hash.is_empty()
            && constant_time_eq(user.password_hash.as_bytes(), password.as_bytes());
        if !plaintext_match {
            let _ = self.verifier.verify(password, &self.dummy_hash);
            if self.settings.legacy_plaintext_upgrade {
                debug!("Login failed: wrong legacy password for {}", user.name);
            } else {
                warn!("User {} has an unhashed stored password; login refused", user.name);
            }
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = self.verifier.hash(password)?;
        self.store
            .update_user(
                user.id,
                UpdateUser {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?;
        warn!("Upgraded legacy plaintext password for user {}", user.name);
        Ok(())
    }

    fn issue(&self, user_id: i64, username: &str, role: UserRole) -> Result<Session, AuthError> {
        let token = self.jwt.generate_token(user_id, username, role)?;
        Ok(Session {
            token,
            user_id,
            username: username.to_string(),
            role,
            expires_in: self.jwt.token_expiry_secs(),
        })
    }

    /// Create a regular user account with a hashed password
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        if Self::is_reserved_name(&registration.name) {
            return Err(AuthError::ReservedName(registration.name));
        }

        let password_hash = self.verifier.hash(&registration.password)?;
        let user = self
            .store
            .insert_user(NewUser {
                name: registration.name,
                email: registration.email,
                password_hash,
                role: UserRole::User,
            })
            .await?;

        metrics::counter!("journal_users_registered_total").increment(1);
        info!("Registered user: {}", user.name);
        Ok(user)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
