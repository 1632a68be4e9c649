//! Accounts, passwords and bearer tokens.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{CatalogError, CatalogResult};

pub mod deliverability;
mod service;
mod token;

pub use deliverability::{
    check_or_assume, ApilayerVerifier, EmailVerifier, ExternalServiceError, Verdict,
};
pub use service::{AuthService, Credentials, Registration, Session};
pub use token::{Claims, TokenIssuer, TOKEN_LIFETIME_DAYS};

/// Accepted email shape: ASCII word characters with optional `.`/`-`
/// separators, and a final 2 or 3 character suffix.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$")
        .expect("email pattern is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn hash_password(password: &str) -> CatalogResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CatalogError::Internal(format!("failed to hash password: {e}")))
}

/// Hash checked when the account does not exist, so unknown emails cost
/// the same argon2 work as a wrong password.
static UNKNOWN_USER_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("unknown-user-placeholder").ok());

/// Runs a full verification against a throwaway hash; always `false`.
pub fn verify_unknown_user(password: &str) -> bool {
    if let Some(hash) = UNKNOWN_USER_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    false
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
