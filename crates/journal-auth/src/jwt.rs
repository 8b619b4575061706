//! JWT token management

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use journal_db::UserRole;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::AuthError;

/// Lifetime of an issued token
pub const TOKEN_EXPIRY_HOURS: i64 = 24;

/// Only the HMAC family is accepted; anything else in the header is rejected.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Username
    pub username: String,
    /// User role
    pub role: UserRole,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// JWT manager for token generation and validation
///
/// The signing secret can be rotated at runtime. Every encode or decode
/// works from one snapshot of the key pair, so a rotation applies to the
/// next call and never splits a single operation across two keys.
pub struct JwtManager {
    keys: RwLock<Arc<SigningKeys>>,
    token_expiry_hours: i64,
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(secret: &str, token_expiry_hours: i64) -> Self {
        Self {
            keys: RwLock::new(Arc::new(SigningKeys::from_secret(secret))),
            token_expiry_hours,
        }
    }

    /// Token lifetime in seconds
    pub fn token_expiry_secs(&self) -> i64 {
        self.token_expiry_hours * 3600
    }

    /// Replace the signing secret
    pub fn rotate_secret(&self, secret: &str) {
        *self.keys.write() = Arc::new(SigningKeys::from_secret(secret));
        info!("JWT signing secret rotated");
    }

    fn keys(&self) -> Arc<SigningKeys> {
        self.keys.read().clone()
    }

    /// Generate a JWT token for a user
    pub fn generate_token(
        &self,
        user_id: i64,
        username: &str,
        role: UserRole,
    ) -> Result<String, AuthError> {
        self.generate_token_at(user_id, username, role, Utc::now())
    }

    fn generate_token_at(
        &self,
        user_id: i64,
        username: &str,
        role: UserRole,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let exp = issued_at + Duration::hours(self.token_expiry_hours);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            exp: exp.timestamp(),
            iat: issued_at.timestamp(),
        };

        debug!("Generating token for user: {}", username);

        let keys = self.keys();
        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).map_err(AuthError::Jwt)
    }

    /// Validate a JWT token and return claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.leeway = 0;

        let keys = self.keys();
        let token_data =
            decode::<Claims>(token, &keys.decoding, &validation).map_err(AuthError::from_decode)?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_generation_and_validation() {
        let manager = JwtManager::new("test-secret-key", TOKEN_EXPIRY_HOURS);

        let token = manager.generate_token(1, "testuser", UserRole::Admin).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "1");
        assert_eq!(claims.username, "testuser");
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_invalid_token() {
        let manager = JwtManager::new("test-secret-key", TOKEN_EXPIRY_HOURS);

        let result = manager.validate_token("invalid-token");
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let manager = JwtManager::new("test-secret-key", TOKEN_EXPIRY_HOURS);
        let issued_at = Utc::now() - Duration::hours(25);

        let token = manager
            .generate_token_at(1, "testuser", UserRole::User, issued_at)
            .unwrap();

        assert!(matches!(
            manager.validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_token_just_inside_window_is_valid() {
        let manager = JwtManager::new("test-secret-key", TOKEN_EXPIRY_HOURS);
        let issued_at = Utc::now() - Duration::hours(23);

        let token = manager
            .generate_token_at(1, "testuser", UserRole::User, issued_at)
            .unwrap();

        assert!(manager.validate_token(&token).is_ok());
    }

    #[test]
    fn test_foreign_key_rejected() {
        let ours = JwtManager::new("test-secret-key", TOKEN_EXPIRY_HOURS);
        let theirs = JwtManager::new("some-other-key", TOKEN_EXPIRY_HOURS);

        let token = theirs.generate_token(1, "mallory", UserRole::Admin).unwrap();
        assert!(matches!(
            ours.validate_token(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_non_hmac_algorithm_rejected() {
        let manager = JwtManager::new("test-secret-key", TOKEN_EXPIRY_HOURS);

        // {"alg":"RS256","typ":"JWT"} . {"sub":"1"} . "sig"
        let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiIxIn0.c2ln";
        assert!(matches!(
            manager.validate_token(token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_other_hmac_variants_accepted() {
        let manager = JwtManager::new("test-secret-key", TOKEN_EXPIRY_HOURS);
        let now = Utc::now();
        let claims = Claims {
            sub: "5".to_string(),
            username: "carol".to_string(),
            role: UserRole::User,
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key"),
        )
        .unwrap();

        assert_eq!(manager.validate_token(&token).unwrap().username, "carol");
    }

    #[test]
    fn test_rotation_applies_to_next_call() {
        let manager = JwtManager::new("first-secret", TOKEN_EXPIRY_HOURS);
        let old_token = manager.generate_token(1, "testuser", UserRole::User).unwrap();

        manager.rotate_secret("second-secret");

        assert!(matches!(
            manager.validate_token(&old_token),
            Err(AuthError::InvalidSignature)
        ));
        let new_token = manager.generate_token(1, "testuser", UserRole::User).unwrap();
        assert!(manager.validate_token(&new_token).is_ok());
    }
}
