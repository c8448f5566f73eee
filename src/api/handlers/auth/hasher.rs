//! Password hashing and the registration password policy.

use anyhow::{Result, anyhow};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

const PASSWORD_MIN_LENGTH: usize = 8;
const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()-+=";

/// Hash a password with Argon2id and a fresh random salt.
///
/// # Errors
/// Returns an error if hashing fails.
pub(crate) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Verify a password against a stored hash.
///
/// Wrong passwords and malformed hashes both return `false`, never an error.
pub(crate) fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Password policy: minimum length plus one uppercase, one lowercase, one
/// digit, and one special character.
pub(crate) fn valid_password(password: &str) -> bool {
    password.len() >= PASSWORD_MIN_LENGTH
        && password.chars().any(char::is_uppercase)
        && password.chars().any(char::is_lowercase)
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c))
}

/// Message returned whenever the policy rejects a password.
pub(crate) const PASSWORD_POLICY_MESSAGE: &str =
    "Enter a valid password with at least 8 characters, one uppercase, one lowercase, one numeric and one special character.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() -> Result<()> {
        let hash = hash_password("Abcdef1!")?;
        assert_ne!(hash, "Abcdef1!");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Abcdef1!", &hash));
        assert!(!verify_password("Abcdef1?", &hash));
        Ok(())
    }

    #[test]
    fn hashes_are_salted() -> Result<()> {
        let first = hash_password("Abcdef1!")?;
        let second = hash_password("Abcdef1!")?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify_password("Abcdef1!", "not-a-phc-string"));
        assert!(!verify_password("Abcdef1!", ""));
    }

    #[test]
    fn policy_accepts_compliant_passwords() {
        assert!(valid_password("Abcdef1!"));
        assert!(valid_password("CorrectHorse7+"));
        assert!(valid_password("p@ssW0rd"));
    }

    #[test]
    fn policy_rejects_missing_classes() {
        assert!(!valid_password("abcdefg1!")); // no uppercase
        assert!(!valid_password("ABCDEFG1!")); // no lowercase
        assert!(!valid_password("Abcdefgh!")); // no digit
        assert!(!valid_password("Abcdefg12")); // no special char
        assert!(!valid_password("Ab1!")); // too short
        assert!(!valid_password(""));
    }
}
