//! Shared fixtures for handler tests.
//!
//! The lazy pool never connects: these tests exercise the validation paths
//! that return before any query is issued.

use anyhow::Result;
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::email::{EmailSender, LogEmailSender};

use super::rate_limit::NoopRateLimiter;
use super::state::{AuthConfig, AuthState};

pub(crate) fn test_pool() -> Result<PgPool> {
    Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
}

pub(crate) fn auth_state() -> Arc<AuthState> {
    let config = AuthConfig::new(
        SecretString::from("access-secret".to_string()),
        SecretString::from("refresh-secret".to_string()),
    );
    Arc::new(AuthState::new(config, Arc::new(NoopRateLimiter)))
}

pub(crate) fn log_mailer() -> Arc<dyn EmailSender> {
    Arc::new(LogEmailSender)
}
