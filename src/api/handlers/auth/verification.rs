//! OTP verification and resend endpoints.

use anyhow::anyhow;
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::email::{EmailSender, OtpEmail};

use super::error::AuthError;
use super::otp::generate_otp;
use super::password::{hash_secret, verify_secret};
use super::rate_limit::{RateLimitAction, RateLimitDecision};
use super::state::AuthState;
use super::storage::{
    find_by_email, mark_email_verified, store_otp_challenge, store_refresh_token_hash,
};
use super::token::issue_token_pair;
use super::types::{AckResponse, AuthResponse, OtpVerifyRequest, ResendOtpRequest};
use super::utils::{extract_client_ip, normalize_email, valid_email};

/// Confirm the emailed code; the only transition into the verified state.
///
/// Expiry is checked before the hash comparison, so expired challenges never
/// pay for a hash verification. Success clears the challenge, marks the
/// email verified, and issues the token pair.
#[utoipa::path(
    post,
    path = "/auth/otp-verify",
    request_body = OtpVerifyRequest,
    responses(
        (status = 200, description = "Email verified; tokens issued", body = AuthResponse),
        (status = 400, description = "Validation failure or no pending challenge", body = String),
        (status = 401, description = "Code expired or wrong", body = String),
        (status = 404, description = "No account for this email", body = String),
        (status = 429, description = "Rate limited", body = String)
    ),
    tag = "auth"
)]
pub async fn otp_verify(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<OtpVerifyRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return AuthError::Validation("Invalid email address.").into_response();
    }
    let code = request.otp.trim();
    if code.is_empty() {
        return AuthError::Validation("OTP is required.").into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if auth_state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::OtpVerify)
        == RateLimitDecision::Limited
        || auth_state
            .rate_limiter()
            .check_email(&email, RateLimitAction::OtpVerify)
            == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    let user = match find_by_email(&pool, &email).await {
        Ok(Some(user)) => user,
        Ok(None) => return AuthError::NotFound.into_response(),
        Err(err) => return AuthError::Internal(err).into_response(),
    };

    let Some(otp_hash) = user.mfa_otp_hash.as_deref() else {
        return AuthError::NoChallenge.into_response();
    };
    if user.mfa_otp_expires_at.is_none() {
        return AuthError::NoChallenge.into_response();
    }
    if user.otp_expired {
        return AuthError::Expired.into_response();
    }

    match verify_secret(code, otp_hash) {
        Ok(true) => {}
        Ok(false) => return AuthError::InvalidCode.into_response(),
        Err(err) => return AuthError::Internal(err).into_response(),
    }

    if let Err(err) = mark_email_verified(&pool, user.id).await {
        return AuthError::Internal(err).into_response();
    }

    let Some(user_response) = user.to_response() else {
        return AuthError::Internal(anyhow!("unknown role stored for user {}", user.id))
            .into_response();
    };

    let tokens = match issue_token_pair(user.id, &user.email, user_response.role, auth_state.config())
    {
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
        message: "Email verified successfully! You are now logged in.".to_string(),
        user: user_response,
        tokens,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Re-issue the pending challenge; idempotent for unverified accounts.
///
/// Repeated calls simply overwrite the stored hash and extend the expiry.
#[utoipa::path(
    post,
    path = "/auth/resend-otp",
    request_body = ResendOtpRequest,
    responses(
        (status = 200, description = "New OTP emailed", body = AckResponse),
        (status = 400, description = "Validation failure or email already verified", body = String),
        (status = 404, description = "No account for this email", body = String),
        (status = 429, description = "Rate limited", body = String),
        (status = 502, description = "Challenge persisted but OTP email delivery failed", body = String)
    ),
    tag = "auth"
)]
pub async fn resend_otp(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    mailer: Extension<Arc<dyn EmailSender>>,
    payload: Option<Json<ResendOtpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return AuthError::Validation("Invalid email address.").into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if auth_state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::ResendOtp)
        == RateLimitDecision::Limited
        || auth_state
            .rate_limiter()
            .check_email(&email, RateLimitAction::ResendOtp)
            == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    let user = match find_by_email(&pool, &email).await {
        Ok(Some(user)) => user,
        Ok(None) => return AuthError::NotFound.into_response(),
        Err(err) => return AuthError::Internal(err).into_response(),
    };

    if user.mfa_email_verified {
        return AuthError::AlreadyVerified.into_response();
    }

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
        message: "OTP has been sent to your email successfully!".to_string(),
        email: user.email,
    };
    (StatusCode::OK, Json(response)).into_response()
}
