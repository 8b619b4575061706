//! Journal Authentication and Authorization
//!
//! This crate provides JWT issuance and validation, password hashing,
//! the login flow, and the request guard that turns a bearer token or
//! session cookie into an [`AuthUser`].

pub mod authenticator;
pub mod error;
pub mod guard;
pub mod jwt;
pub mod password;

pub use authenticator::{
    ADMIN_SENTINEL_ID, Authenticator, AuthenticatorSettings, RESERVED_ADMIN_NAME, Registration,
    Session,
};
pub use error::AuthError;
pub use guard::{
    AuthUser, TOKEN_COOKIE, authenticate, clear_session_cookie, extract_token, require_admin,
    session_cookie,
};
pub use jwt::{Claims, JwtManager, TOKEN_EXPIRY_HOURS};
pub use password::{Argon2Verifier, PasswordVerifier};
