//! Secret hashing shared by passwords, OTP codes, and refresh tokens.
//!
//! Argon2id with the crate defaults (memory: 19 MiB, iterations: 2,
//! parallelism: 1). Salt is randomly generated per hash, so the same secret
//! never produces the same digest twice. Verification is constant-time on
//! the digest comparison.

use anyhow::{anyhow, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

/// Hash a secret into an Argon2id PHC-format string.
pub(super) fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("secret hash error: {err}"))
}

/// Verify a secret against a stored PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or an error when
/// the stored hash is malformed.
pub(super) fn verify_secret(secret: &str, hash: &str) -> Result<bool> {
    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|err| anyhow!("invalid hash format: {err}"))?;

    let argon2 = Argon2::default();
    match argon2.verify_password(secret.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(anyhow!("verify error: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_secret_matches() {
        let hash = hash_secret("hunter2").unwrap();
        assert!(verify_secret("hunter2", &hash).unwrap());
    }

    #[test]
    fn wrong_secret_does_not_match() {
        let hash = hash_secret("hunter2").unwrap();
        assert!(!verify_secret("wrong", &hash).unwrap());
    }

    #[test]
    fn same_secret_hashes_differently() {
        // Fresh salt per call.
        let first = hash_secret("123456").unwrap();
        let second = hash_secret("123456").unwrap();
        assert_ne!(first, second);
        assert!(verify_secret("123456", &first).unwrap());
        assert!(verify_secret("123456", &second).unwrap());
    }

    #[test]
    fn malformed_hash_returns_error() {
        assert!(verify_secret("pw", "not-a-hash").is_err());
    }
}
