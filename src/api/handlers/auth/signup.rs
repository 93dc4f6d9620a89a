//! Account registration endpoint.

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
use super::password::hash_secret;
use super::rate_limit::{RateLimitAction, RateLimitDecision};
use super::state::AuthState;
use super::storage::{insert_user, NewUser, SignupOutcome};
use super::types::{AckResponse, SignupRequest};
use super::utils::{extract_client_ip, normalize_email, valid_email, valid_password};

/// Register a new account and email its first verification code.
///
/// The user is persisted in the pending-verification state before the email
/// leaves; a delivery failure therefore returns 502 without rolling back.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User registered; OTP emailed", body = AckResponse),
        (status = 400, description = "Validation failure or email already registered", body = String),
        (status = 429, description = "Rate limited", body = String),
        (status = 502, description = "User persisted but OTP email delivery failed", body = String)
    ),
    tag = "auth"
)]
pub async fn signup(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    mailer: Extension<Arc<dyn EmailSender>>,
    payload: Option<Json<SignupRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    // Validation happens before any store mutation.
    let first_name = request.first_name.trim().to_string();
    if first_name.is_empty() {
        return AuthError::Validation("First name is required.").into_response();
    }
    let last_name = request
        .last_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return AuthError::Validation("Invalid email address.").into_response();
    }
    if !valid_password(&request.password) {
        return AuthError::Validation("Password must be at least 8 characters long.")
            .into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if auth_state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::Signup)
        == RateLimitDecision::Limited
        || auth_state
            .rate_limiter()
            .check_email(&email, RateLimitAction::Signup)
            == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    let password_hash = match hash_secret(&request.password) {
        Ok(hash) => hash,
        Err(err) => return AuthError::Internal(err).into_response(),
    };

    let otp = generate_otp();
    let otp_hash = match hash_secret(&otp) {
        Ok(hash) => hash,
        Err(err) => return AuthError::Internal(err).into_response(),
    };

    let user = match insert_user(
        &pool,
        NewUser {
            first_name,
            last_name,
            email,
            password_hash,
            otp_hash,
        },
    )
    .await
    {
        Ok(SignupOutcome::Created(user)) => user,
        Ok(SignupOutcome::Conflict) => return AuthError::AlreadyExists.into_response(),
        Err(err) => return AuthError::Internal(err).into_response(),
    };

    if let Err(err) = mailer.send(&OtpEmail {
        to_email: user.email.clone(),
        first_name: user.first_name.clone(),
        otp,
    }) {
        return AuthError::MailDelivery(err).into_response();
    }

    let response = AckResponse {
        message: "User registered successfully! Please check your email for the OTP to verify \
                  your account."
            .to_string(),
        email: user.email,
    };
    (StatusCode::CREATED, Json(response)).into_response()
}
