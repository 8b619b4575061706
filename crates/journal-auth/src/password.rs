//! Password hashing and verification (Argon2id)

use argon2::{
    Argon2, Params,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier as _, SaltString, rand_core::OsRng,
    },
};

use crate::error::AuthError;

/// The single capability used to store and check passwords
pub trait PasswordVerifier: Send + Sync {
    /// Hash a plaintext password into a self-describing string
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Check a plaintext password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch and `Err` if `hash` is not a hash
    /// this verifier understands.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;

    /// Whether `stored` is a hash produced by this verifier
    fn is_hash(&self, stored: &str) -> bool;
}

/// Argon2id with PHC string output (`$argon2id$v=19$...`)
#[derive(Clone, Default)]
pub struct Argon2Verifier {
    params: Option<Params>,
}

impl Argon2Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit cost parameters instead of the crate defaults
    pub fn with_params(params: Params) -> Self {
        Self {
            params: Some(params),
        }
    }

    fn hasher(&self) -> Argon2<'static> {
        match &self.params {
            Some(params) => Argon2::new(
                argon2::Algorithm::Argon2id,
                argon2::Version::V0x13,
                params.clone(),
            ),
            None => Argon2::default(),
        }
    }
}

impl PasswordVerifier for Argon2Verifier {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        // Cost parameters come from the PHC string, not from `self`
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    fn is_hash(&self, stored: &str) -> bool {
        PasswordHash::new(stored).is_ok_and(|h| h.algorithm.as_str().starts_with("argon2"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> Argon2Verifier {
        Argon2Verifier::with_params(Params::new(1024, 1, 1, None).unwrap())
    }

    #[test]
    fn test_hash_and_verify() {
        let verifier = verifier();
        let hash = verifier.hash("p@ss").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verifier.verify("p@ss", &hash).unwrap());
        assert!(!verifier.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let verifier = verifier();
        assert_ne!(verifier.hash("same").unwrap(), verifier.hash("same").unwrap());
    }

    #[test]
    fn test_plaintext_is_not_a_hash() {
        let verifier = verifier();
        assert!(!verifier.is_hash("12345"));
        assert!(!verifier.is_hash(""));
        assert!(verifier.is_hash(&verifier.hash("12345").unwrap()));
        assert!(verifier.verify("12345", "12345").is_err());
    }

    #[test]
    fn test_default_params_verify_with_custom_verifier() {
        let hash = Argon2Verifier::new().hash("p@ss").unwrap();
        assert!(verifier().verify("p@ss", &hash).unwrap());
    }
}
