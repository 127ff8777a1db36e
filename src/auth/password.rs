//! Password hashing and verification with bcrypt.
//!
//! Length and format rules live in `validators`; this module only deals
//! with the hash itself. Hashing embeds a fresh random salt on every
//! call, so two hashes of the same password never match, and
//! verification compares in constant time inside bcrypt.

use bcrypt::{hash, verify};

use crate::error::AuthError;

/// Hash a plain text password at the given work factor.
///
/// Deliberately CPU-heavy. Call it through `spawn_blocking` from async
/// contexts so concurrent logins are not serialized behind it.
///
/// # Errors
/// Returns `AuthError::Internal` if bcrypt rejects the cost or fails.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    hash(password, cost)
        .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a plain text password against a stored bcrypt hash.
///
/// A mismatch is `Ok(false)`, not an error; `Err` means bcrypt itself
/// failed (for example on a corrupt stored hash).
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    verify(password, hash)
        .map_err(|e| AuthError::Internal(format!("Password verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // lowest cost bcrypt accepts; production uses the configured cost
    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_password() {
        let password = "secret-password-1";
        let hash = hash_password(password, TEST_COST).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let password = "secret-password-1";
        let first = hash_password(password, TEST_COST).expect("Failed to hash password");
        let second = hash_password(password, TEST_COST).expect("Failed to hash password");

        // per-call random salt
        assert_ne!(first, second);
        assert!(verify_password(password, &first).expect("Failed to verify password"));
        assert!(verify_password(password, &second).expect("Failed to verify password"));
    }

    #[test]
    fn test_verify_password() {
        let password = "secret-password-1";
        let hash = hash_password(password, TEST_COST).expect("Failed to hash password");

        let is_valid = verify_password(password, &hash).expect("Failed to verify password");
        assert!(is_valid);
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("secret-password-1", TEST_COST).expect("Failed to hash password");

        let is_valid =
            verify_password("wrong-password-2", &hash).expect("Failed to verify password");
        assert!(!is_valid);
    }

    #[test]
    fn test_corrupt_hash_is_an_error() {
        assert!(verify_password("secret-password-1", "not-a-bcrypt-hash").is_err());
    }

    #[test]
    fn test_invalid_cost_is_an_error() {
        assert!(hash_password("secret-password-1", 1).is_err());
    }
}
