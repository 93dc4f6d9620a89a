//! Credential verification endpoint.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use anyhow::anyhow;
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::email::{EmailSender, OtpEmail};

use super::error::AuthError;
use super::otp::generate_otp;
use super::password::{hash_secret, verify_secret};
use super::rate_limit::{RateLimitAction, RateLimitDecision};
use super::state::AuthState;
use super::storage::{find_by_email, store_otp_challenge, store_refresh_token_hash};
use super::token::issue_token_pair;
use super::types::{AckResponse, AuthResponse, SigninRequest};
use super::utils::{extract_client_ip, normalize_email, valid_email};

/// Verify credentials and either issue tokens or restart the OTP challenge.
///
/// A correct password is not sufficient while the email is unverified: the
/// pending branch regenerates the code, re-sends it, and acknowledges
/// without tokens.
#[utoipa::path(
    post,
    path = "/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Tokens issued, or OTP re-sent for unverified accounts", body = AuthResponse),
        (status = 400, description = "Validation failure or wrong password", body = String),
        (status = 404, description = "No account for this email", body = String),
        (status = 429, description = "Rate limited", body = String),
        (status = 502, description = "Challenge persisted but OTP email delivery failed", body = String)
    ),
    tag = "auth"
)]
pub async fn signin(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    mailer: Extension<Arc<dyn EmailSender>>,
    payload: Option<Json<SigninRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return AuthError::Validation("Invalid email address.").into_response();
    }
    if request.password.is_empty() {
        return AuthError::Validation("Password is required.").into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if auth_state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::Signin)
        == RateLimitDecision::Limited
        || auth_state
            .rate_limiter()
            .check_email(&email, RateLimitAction::Signin)
            == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    let user = match find_by_email(&pool, &email).await {
        Ok(Some(user)) => user,
        Ok(None) => return AuthError::NotFound.into_response(),
        Err(err) => return AuthError::Internal(err).into_response(),
    };

    match verify_secret(&request.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return AuthError::InvalidCredentials.into_response(),
        Err(err) => return AuthError::Internal(err).into_response(),
    }

    if user.mfa_email_verified {
        // Verified account: mint the pair and rotate the stored refresh hash.
        let Some(user_response) = user.to_response() else {
            return AuthError::Internal(anyhow!("unknown role stored for user {}", user.id))
                .into_response();
        };

        let tokens =
            match issue_token_pair(user.id, &user.email, user_response.role, auth_state.config()) {
                Ok(tokens) => tokens,
                Err(err) => return AuthError::Internal(err).into_response(),
            };

        let refresh_hash = match hash_secret(&tokens.refresh_token) {
            Ok(hash) => hash,
            Err(err) => return AuthError::Internal(err).into_response(),
        };
        if let Err(err) = store_refresh_token_hash(&pool, user.id, &refresh_hash).await {
            return AuthError::Internal(err).into_response();
        }

        let response = AuthResponse {
            message: "User logged in successfully!".to_string(),
            user: user_response,
            tokens,
        };
        return (StatusCode::OK, Json(response)).into_response();
    }

    // Pending verification: overwrite the challenge and re-send the code.
    let otp = generate_otp();
    let otp_hash = match hash_secret(&otp) {
        Ok(hash) => hash,
        Err(err) => return AuthError::Internal(err).into_response(),
    };
    if let Err(err) = store_otp_challenge(&pool, user.id, &otp_hash).await {
        return AuthError::Internal(err).into_response();
    }

    if let Err(err) = mailer.send(&OtpEmail {
        to_email: user.email.clone(),
        first_name: user.first_name.clone(),
        otp,
    }) {
        return AuthError::MailDelivery(err).into_response();
    }

    let response = AckResponse {
        message: "Email not verified. OTP has been sent to your email.".to_string(),
        email: user.email,
    };
    (StatusCode::OK, Json(response)).into_response()
}
