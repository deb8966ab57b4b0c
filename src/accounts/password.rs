//! Password hashing and verification using Argon2id

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::AccountError;

/// Hash a password, returning the PHC string (salt and parameters included)
pub fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::Hashing(e.to_string()))
}

/// Outcome of checking a password against a stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Match,
    Mismatch,
    /// Stored value is not a hash and equals the password; caller should re-hash it
    LegacyMatch,
}

/// Check a password against a stored value, which may be a PHC hash or,
/// for records created before hashing, the plaintext itself.
pub fn check_password(password: &str, stored: &str) -> PasswordCheck {
    match PasswordHash::new(stored) {
        Ok(parsed) => {
            if Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
            {
                PasswordCheck::Match
            } else {
                PasswordCheck::Mismatch
            }
        }
        Err(_) if stored == password => PasswordCheck::LegacyMatch,
        Err(_) => PasswordCheck::Mismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_check() {
        let hash = hash_password("correct-horse-battery-staple").unwrap();
        assert!(hash.starts_with("$argon2"));

        assert_eq!(
            check_password("correct-horse-battery-staple", &hash),
            PasswordCheck::Match
        );
        assert_eq!(check_password("wrong", &hash), PasswordCheck::Mismatch);
    }

    #[test]
    fn test_different_salts() {
        let first = hash_password("same").unwrap();
        let second = hash_password("same").unwrap();
        assert_ne!(first, second);
        assert_eq!(check_password("same", &first), PasswordCheck::Match);
        assert_eq!(check_password("same", &second), PasswordCheck::Match);
    }

    #[test]
    fn test_legacy_plaintext() {
        assert_eq!(check_password("hunter2", "hunter2"), PasswordCheck::LegacyMatch);
        assert_eq!(check_password("hunter3", "hunter2"), PasswordCheck::Mismatch);
    }
}
