use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use super::errors::AuthError;

/// Hash a plaintext password with a fresh random salt.
/// Hashing failure is fatal to the caller's request.
pub fn hash(plaintext: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|digest| digest.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

/// Verify a plaintext password against a stored digest.
/// Never errors: a malformed digest verifies as false.
pub fn verify(plaintext: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_verifies() {
        let digest = hash("correct horse").unwrap();
        assert!(verify("correct horse", &digest));
    }

    #[test]
    fn wrong_password_fails() {
        let digest = hash("correct horse").unwrap();
        assert!(!verify("battery staple", &digest));
    }

    #[test]
    fn digests_are_salted() {
        let a = hash("same input").unwrap();
        let b = hash("same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_digest_is_false_not_error() {
        assert!(!verify("anything", "not-a-phc-string"));
        assert!(!verify("anything", ""));
    }
}
