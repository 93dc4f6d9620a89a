//! Authenticated principal extraction and the access policy.
//!
//! Handlers receive a typed identity decoded from the bearer access token —
//! no database lookup, no implicit injection. The policy is a single
//! function: a record is accessible to its owner or to an admin.

use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};

use super::state::AuthState;
use super::token::decode_access_token;
use super::types::Role;

/// Authenticated user context derived from the access token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

impl Principal {
    /// Self-or-admin check applied uniformly to user-record access.
    #[must_use]
    pub fn can_access(&self, target_id: i64) -> bool {
        self.user_id == target_id || self.role == Role::Admin
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Resolve the bearer access token into a principal, or return 401.
pub fn require_auth(headers: &HeaderMap, state: &AuthState) -> Result<Principal, StatusCode> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    match decode_access_token(&token, state.config()) {
        Ok(claims) => Ok(Principal {
            user_id: claims.id,
            email: claims.email,
            role: claims.role,
        }),
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::super::rate_limit::NoopRateLimiter;
    use super::super::state::AuthConfig;
    use super::super::token::issue_token_pair;
    use super::*;
    use axum::http::HeaderValue;
    use secrecy::SecretString;
    use std::sync::Arc;

    fn test_state() -> AuthState {
        let config = AuthConfig::new(
            SecretString::from("access-secret".to_string()),
            SecretString::from("refresh-secret".to_string()),
        );
        AuthState::new(config, Arc::new(NoopRateLimiter))
    }

    fn principal(user_id: i64, role: Role) -> Principal {
        Principal {
            user_id,
            email: "someone@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn owner_can_access_own_record_only() {
        let actor = principal(1, Role::User);
        assert!(actor.can_access(1));
        assert!(!actor.can_access(2));
        assert!(!actor.is_admin());
    }

    #[test]
    fn admin_can_access_any_record() {
        let actor = principal(1, Role::Admin);
        assert!(actor.can_access(1));
        assert!(actor.can_access(999));
        assert!(actor.is_admin());
    }

    #[test]
    fn require_auth_accepts_issued_access_token() {
        let state = test_state();
        let pair = issue_token_pair(42, "alice@example.com", Role::Admin, state.config()).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", pair.access_token)).unwrap(),
        );

        let principal = require_auth(&headers, &state).unwrap();
        assert_eq!(principal.user_id, 42);
        assert_eq!(principal.email, "alice@example.com");
        assert_eq!(principal.role, Role::Admin);
    }

    #[test]
    fn require_auth_rejects_missing_header() {
        let state = test_state();
        let denied = require_auth(&HeaderMap::new(), &state).unwrap_err();
        assert_eq!(denied, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn require_auth_rejects_garbage_token() {
        let state = test_state();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        let denied = require_auth(&headers, &state).unwrap_err();
        assert_eq!(denied, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn require_auth_rejects_refresh_token() {
        let state = test_state();
        let pair = issue_token_pair(42, "alice@example.com", Role::User, state.config()).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", pair.refresh_token)).unwrap(),
        );
        let denied = require_auth(&headers, &state).unwrap_err();
        assert_eq!(denied, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn bearer_extraction_handles_casing_and_whitespace() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer  abc "));
        assert_eq!(extract_bearer_token(&headers), Some("abc".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
