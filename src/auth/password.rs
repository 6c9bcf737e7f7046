//! Password hashing with Argon2id
//!
//! Hashes are stored as PHC strings, so the salt and parameters travel with
//! the hash and verification needs nothing else.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use zeroize::Zeroizing;

use crate::error::{BudgetError, BudgetResult};

/// A password held in memory that is wiped on drop
pub type Secret = Zeroizing<String>;

pub fn secret(s: impl Into<String>) -> Secret {
    Zeroizing::new(s.into())
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> BudgetResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| BudgetError::Auth(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string
pub fn verify_password(password: &str, stored: &str) -> BudgetResult<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| BudgetError::Auth(format!("Stored password hash is invalid: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Prompt for a password on the terminal without echo
pub fn prompt_password(prompt: &str) -> BudgetResult<Secret> {
    rpassword::prompt_password(prompt)
        .map(secret)
        .map_err(|e| BudgetError::Io(format!("Failed to read password: {}", e)))
}
