//! Password hashing for stored user credentials
//!
//! The `users.password` column holds an Argon2 PHC string, never the
//! password itself.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use tracing::warn;

use crate::{Error, Result};

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::AuthError(format!("Failed to hash password: {}", e)))?
        .to_string();
    Ok(hash)
}

/// Check a password against a stored hash.
///
/// A stored value that isn't a valid PHC string never matches.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("secret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret", &hash));
        assert!(!verify_password("Secret", &hash));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let a = hash_password("secret").unwrap();
        let b = hash_password("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_plaintext_stored_value_never_matches() {
        assert!(!verify_password("secret", "secret"));
        assert!(!verify_password("", ""));
    }
}
