//! Auth state and token configuration.

use secrecy::SecretString;
use std::sync::Arc;

use super::rate_limit::RateLimiter;

const DEFAULT_ACCESS_EXPIRY_SECS: i64 = 15 * 60;
const DEFAULT_REFRESH_EXPIRY_SECS: i64 = 7 * 24 * 60 * 60;

/// Token secrets and lifetimes.
///
/// Access and refresh tokens are signed with distinct secrets so one cannot
/// stand in for the other.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    access_secret: SecretString,
    refresh_secret: SecretString,
    access_expiry_secs: i64,
    refresh_expiry_secs: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(access_secret: SecretString, refresh_secret: SecretString) -> Self {
        Self {
            access_secret,
            refresh_secret,
            access_expiry_secs: DEFAULT_ACCESS_EXPIRY_SECS,
            refresh_expiry_secs: DEFAULT_REFRESH_EXPIRY_SECS,
        }
    }

    #[must_use]
    pub fn with_access_expiry_secs(mut self, seconds: i64) -> Self {
        self.access_expiry_secs = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_expiry_secs(mut self, seconds: i64) -> Self {
        self.refresh_expiry_secs = seconds;
        self
    }

    pub(crate) fn access_secret(&self) -> &SecretString {
        &self.access_secret
    }

    pub(crate) fn refresh_secret(&self) -> &SecretString {
        &self.refresh_secret
    }

    pub(crate) fn access_expiry_secs(&self) -> i64 {
        self.access_expiry_secs
    }

    pub(crate) fn refresh_expiry_secs(&self) -> i64 {
        self.refresh_expiry_secs
    }
}

pub struct AuthState {
    config: AuthConfig,
    rate_limiter: Arc<dyn RateLimiter>,
}

impl AuthState {
    pub fn new(config: AuthConfig, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            config,
            rate_limiter,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(super) fn rate_limiter(&self) -> &dyn RateLimiter {
        self.rate_limiter.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::super::rate_limit::{NoopRateLimiter, RateLimiter};
    use super::{AuthConfig, AuthState};
    use secrecy::{ExposeSecret, SecretString};
    use std::sync::Arc;

    fn secrets() -> (SecretString, SecretString) {
        (
            SecretString::from("access".to_string()),
            SecretString::from("refresh".to_string()),
        )
    }

    #[test]
    fn auth_config_defaults_and_overrides() {
        let (access, refresh) = secrets();
        let config = AuthConfig::new(access, refresh);

        assert_eq!(config.access_secret().expose_secret(), "access");
        assert_eq!(config.refresh_secret().expose_secret(), "refresh");
        assert_eq!(
            config.access_expiry_secs(),
            super::DEFAULT_ACCESS_EXPIRY_SECS
        );
        assert_eq!(
            config.refresh_expiry_secs(),
            super::DEFAULT_REFRESH_EXPIRY_SECS
        );

        let config = config
            .with_access_expiry_secs(120)
            .with_refresh_expiry_secs(3600);

        assert_eq!(config.access_expiry_secs(), 120);
        assert_eq!(config.refresh_expiry_secs(), 3600);
    }

    #[test]
    fn auth_state_constructs_with_noop_rate_limiter() {
        let (access, refresh) = secrets();
        let limiter: Arc<dyn RateLimiter> = Arc::new(NoopRateLimiter);
        let state = AuthState::new(AuthConfig::new(access, refresh), limiter);
        assert_eq!(state.config().access_expiry_secs(), 15 * 60);
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let config = AuthConfig::new(
            SecretString::from("hunter2".to_string()),
            SecretString::from("hunter3".to_string()),
        );
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("hunter3"));
    }
}
