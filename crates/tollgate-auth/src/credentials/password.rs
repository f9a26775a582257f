//! Password hashing for user credentials.
//!
//! - Hashing uses Argon2id (hybrid mode) with default parameters
//! - Salts are generated using OsRng (cryptographically secure RNG)
//! - Hashes are stored as PHC strings, so parameters travel with the hash

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hash a password for storage using Argon2id.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
///
/// # Example
///
/// ```
/// use tollgate_auth::credentials::password::{hash_password, verify_password};
///
/// let hash = hash_password("correct horse").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// assert!(verify_password("correct horse", &hash).unwrap());
/// ```
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash.
///
/// The comparison itself is constant-time.
///
/// # Returns
///
/// `Ok(true)` on match, `Ok(false)` on mismatch.
///
/// # Errors
///
/// Returns `Err` only if the stored hash cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted() {
        let first = hash_password("hunter22").unwrap();
        let second = hash_password("hunter22").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("hunter22", &first).unwrap());
        assert!(verify_password("hunter22", &second).unwrap());
    }

    #[test]
    fn test_wrong_password_is_false() {
        let hash = hash_password("hunter22").unwrap();
        assert!(!verify_password("hunter23", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_unparsable_hash_is_error() {
        assert!(verify_password("hunter22", "plaintext").is_err());
    }
}
