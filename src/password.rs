//! One-way password hashing.
//!
//! Passwords are stored as Argon2id PHC strings, each with its own random salt.

use crate::errors::Error;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hashes a plaintext password with a freshly generated salt
///
/// # Errors
///
/// Returns an Error if the hasher rejects the input
pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::PasswordHashError(e.to_string()))?;
    Ok(hash.to_string())
}

/// Checks a plaintext password against a stored hash.
///
/// A stored value that is not a valid PHC string never verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
