//! JWT access/refresh token issuance and verification.
//!
//! Both tokens carry the same claims (`id`, `email`, `role`) but are signed
//! with distinct secrets and lifetimes. The access token is stateless and
//! self-verifying; the refresh token is additionally hashed into the user
//! record by the callers so it can be revoked by overwriting the hash.

use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use super::state::AuthConfig;
use super::types::{Role, TokenPair};

/// Claims embedded in every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TokenClaims {
    /// User ID.
    pub id: i64,
    pub email: String,
    pub role: Role,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Why a token failed to decode.
#[derive(Debug)]
pub(crate) enum TokenError {
    Expired,
    Invalid(String),
}

/// Issue a signed HS256 access/refresh pair for a user.
pub(super) fn issue_token_pair(
    user_id: i64,
    email: &str,
    role: Role,
    config: &AuthConfig,
) -> Result<TokenPair> {
    let access_token = sign(
        user_id,
        email,
        role,
        config.access_secret(),
        config.access_expiry_secs(),
    )?;
    let refresh_token = sign(
        user_id,
        email,
        role,
        config.refresh_secret(),
        config.refresh_expiry_secs(),
    )?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Decode and verify an access token (signature + expiry).
pub(crate) fn decode_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<TokenClaims, TokenError> {
    let key = DecodingKey::from_secret(config.access_secret().expose_secret().as_bytes());

    decode::<TokenClaims>(token, &key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|err| match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(err.to_string()),
        })
}

fn sign(
    user_id: i64,
    email: &str,
    role: Role,
    secret: &SecretString,
    expiry_secs: i64,
) -> Result<String> {
    let now = unix_now();
    let claims = TokenClaims {
        id: user_id,
        email: email.to_string(),
        role,
        iat: now,
        exp: now + expiry_secs,
    };

    let key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
    encode(&Header::default(), &claims, &key).context("JWT encode failed")
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig::new(
            SecretString::from("access-secret".to_string()),
            SecretString::from("refresh-secret".to_string()),
        )
    }

    #[test]
    fn access_token_round_trips_claims() {
        let config = test_config();
        let pair = issue_token_pair(42, "alice@example.com", Role::Admin, &config).unwrap();

        let claims = decode_access_token(&pair.access_token, &config).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.exp - claims.iat, config.access_expiry_secs());
    }

    #[test]
    fn refresh_token_is_not_a_valid_access_token() {
        // Distinct secrets: one token cannot stand in for the other.
        let config = test_config();
        let pair = issue_token_pair(42, "alice@example.com", Role::User, &config).unwrap();

        assert!(matches!(
            decode_access_token(&pair.refresh_token, &config),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let config = test_config();
        let now = unix_now();
        let claims = TokenClaims {
            id: 1,
            email: "alice@example.com".to_string(),
            role: Role::User,
            iat: now - 7200,
            exp: now - 3600,
        };
        let key = EncodingKey::from_secret(
            config.access_secret().expose_secret().as_bytes(),
        );
        let token = encode(&Header::default(), &claims, &key).unwrap();

        assert!(matches!(
            decode_access_token(&token, &config),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let config = test_config();
        assert!(matches!(
            decode_access_token("not-a-token", &config),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn pair_tokens_differ() {
        let config = test_config();
        let pair = issue_token_pair(7, "bob@example.com", Role::User, &config).unwrap();
        assert_ne!(pair.access_token, pair.refresh_token);
    }
}
