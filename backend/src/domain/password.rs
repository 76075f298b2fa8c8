//! Password hashing for local credential accounts.
//!
//! Passwords are stored as Argon2 PHC strings. Verification parses the stored
//! string, so parameters can evolve without invalidating existing hashes.

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use rand::RngCore;
use thiserror::Error;

/// Errors raised while producing a password hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordHashError {
    /// The hashing backend rejected the input.
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Hash a plaintext password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordHashError::Hash(e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordHashError::Hash(e.to_string()))?;
    Ok(phc.to_string())
}

/// Verify a plaintext password against a stored PHC string.
///
/// Unparseable hashes verify as false rather than erroring, so a corrupted
/// row degrades to a failed login instead of a 500.
#[must_use]
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash_password("longpassword1").expect("hash");
        assert!(verify_password(&hash, "longpassword1"));
        assert!(!verify_password(&hash, "longpassword2"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("longpassword1").expect("hash");
        let b = hash_password("longpassword1").expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_hash_verifies_false() {
        assert!(!verify_password("not-a-phc-string", "whatever"));
    }
}
