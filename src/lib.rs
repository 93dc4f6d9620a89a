//! # Konfirmo (Email OTP Authentication)
//!
//! `konfirmo` is an authentication backend: account registration, credential
//! verification, email-OTP confirmation, and JWT session issuance on top of
//! user management with role-based access control.
//!
//! ## Account Lifecycle
//!
//! Accounts move through three states derived from stored flags:
//! unregistered, pending verification, and verified.
//!
//! - **Signup** creates a pending account, hashes the password, and emails a
//!   6-digit one-time code. No tokens are issued at this point.
//! - **Signin** on a verified account returns an access/refresh token pair.
//!   On a pending account it regenerates the code and re-sends the email
//!   instead — a correct password alone never logs in an unverified account.
//! - **OTP verification** is the only transition to the verified state: it
//!   clears the challenge, marks the email verified, and issues tokens.
//!
//! ## Tokens
//!
//! Access and refresh tokens are JWTs signed with distinct secrets and
//! expiries. Only an Argon2id hash of the refresh token is stored, so a
//! token can be revoked by overwriting the hash without ever persisting the
//! secret itself. Passwords and OTP codes use the same hashing primitive.
//!
//! ## Authorization
//!
//! Every user carries a role (`user` or `admin`). User records are readable
//! and writable by their owner or by an admin; listing all users is
//! admin-only. Violations return `403 Forbidden` — the identity comes from
//! the bearer access token, never from the request body.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
