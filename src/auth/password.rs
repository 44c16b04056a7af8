//! Password hashing and verification
//!
//! bcrypt with a per-hash random salt. Neither the plaintext nor the hash is
//! ever included in an error message.

use thiserror::Error;

/// Errors that can occur while hashing or verifying a password
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password hashing failed")]
    HashingFailed,

    #[error("Stored password hash is malformed")]
    MalformedHash,
}

/// Hash a plaintext password with the given bcrypt cost.
pub fn hash_password(plaintext: &str, cost: u32) -> Result<String, PasswordError> {
    bcrypt::hash(plaintext, cost).map_err(|e| {
        tracing::error!(error = %e, "bcrypt hashing failed");
        PasswordError::HashingFailed
    })
}

/// Verify a plaintext password against a stored bcrypt hash.
///
/// # Returns
/// * `Ok(true)` if the password matches
/// * `Ok(false)` if it does not
/// * `Err(PasswordError::MalformedHash)` if `hash` is not a bcrypt hash
pub fn verify_password(plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
    bcrypt::verify(plaintext, hash).map_err(|_| PasswordError::MalformedHash)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("pw123", TEST_COST).unwrap();

        assert_ne!(hash, "pw123");
        assert!(verify_password("pw123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_salt_randomization() {
        let first = hash_password("same-password", TEST_COST).unwrap();
        let second = hash_password("same-password", TEST_COST).unwrap();

        assert_ne!(first, second);
        assert!(verify_password("same-password", &first).unwrap());
        assert!(verify_password("same-password", &second).unwrap());
    }

    #[test]
    fn test_malformed_hash() {
        let result = verify_password("pw123", "not-a-bcrypt-hash");
        assert!(matches!(result, Err(PasswordError::MalformedHash)));
    }

    #[test]
    fn test_invalid_cost() {
        let result = hash_password("pw123", 2);
        assert!(matches!(result, Err(PasswordError::HashingFailed)));
    }

    #[test]
    fn test_error_messages_do_not_leak_input() {
        let err = verify_password("super-secret", "garbage").unwrap_err();
        let rendered = err.to_string();
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("garbage"));
    }
}
