//! Auth handlers and supporting modules.
//!
//! This module coordinates the account state machine (unregistered →
//! pending verification → verified), the OTP challenge lifecycle, and JWT
//! issuance.
//!
//! ## Challenge lifecycle
//!
//! At most one challenge exists per user: issuing a new code overwrites the
//! stored hash and extends the expiry. Only the Argon2id hash of a code is
//! persisted, alongside its absolute expiry; verification checks the expiry
//! (database clock) before paying for the hash comparison.
//!
//! ## Rate limiting
//!
//! The four flows consult a [`RateLimiter`] per client IP and per email.
//! The default [`NoopRateLimiter`] allows everything; deployments plug in a
//! real limiter behind the same trait.
//!
//! [`RateLimiter`]: rate_limit::RateLimiter

pub(crate) mod error;
mod otp;
mod password;
pub(crate) mod principal;
mod rate_limit;
pub(crate) mod signin;
pub(crate) mod signup;
mod state;
mod storage;
pub(crate) mod token;
pub(crate) mod types;
mod utils;
pub(crate) mod verification;

pub use rate_limit::NoopRateLimiter;
pub use state::{AuthConfig, AuthState};

#[cfg(test)]
pub(crate) mod test_support;
