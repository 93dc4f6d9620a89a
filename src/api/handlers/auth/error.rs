//! Error surface for the auth and user-management endpoints.
//!
//! Every orchestration failure is terminal for the request: it maps straight
//! to a client-visible status and message, with database details logged and
//! collapsed to a generic 500. Mail delivery gets its own status so callers
//! can tell "state changed but notification failed" apart from "state
//! unchanged".

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

#[derive(Debug)]
pub(crate) enum AuthError {
    AlreadyExists,
    NotFound,
    InvalidCredentials,
    NoChallenge,
    Expired,
    InvalidCode,
    AlreadyVerified,
    Forbidden,
    Validation(&'static str),
    MailDelivery(anyhow::Error),
    Internal(anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::AlreadyExists => {
                (StatusCode::BAD_REQUEST, "User already exists!").into_response()
            }
            Self::NotFound => (StatusCode::NOT_FOUND, "User not found!").into_response(),
            Self::InvalidCredentials => {
                (StatusCode::BAD_REQUEST, "Invalid credentials").into_response()
            }
            Self::NoChallenge => (
                StatusCode::BAD_REQUEST,
                "No OTP found. Please request a new one.",
            )
                .into_response(),
            Self::Expired => (
                StatusCode::UNAUTHORIZED,
                "OTP has expired. Please request a new one.",
            )
                .into_response(),
            Self::InvalidCode => (StatusCode::UNAUTHORIZED, "Invalid OTP").into_response(),
            Self::AlreadyVerified => {
                (StatusCode::BAD_REQUEST, "Email is already verified.").into_response()
            }
            Self::Forbidden => (StatusCode::FORBIDDEN, "Access Denied").into_response(),
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::MailDelivery(err) => {
                error!("Failed to deliver OTP email: {err}");
                (StatusCode::BAD_GATEWAY, "Failed to send OTP email").into_response()
            }
            Self::Internal(err) => {
                error!("Failed to handle auth request: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn status(err: AuthError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn statuses_match_the_taxonomy() {
        assert_eq!(status(AuthError::AlreadyExists), StatusCode::BAD_REQUEST);
        assert_eq!(status(AuthError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status(AuthError::InvalidCredentials),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(AuthError::NoChallenge), StatusCode::BAD_REQUEST);
        assert_eq!(status(AuthError::Expired), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::InvalidCode), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::AlreadyVerified), StatusCode::BAD_REQUEST);
        assert_eq!(status(AuthError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            status(AuthError::Validation("bad input")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AuthError::MailDelivery(anyhow!("smtp down"))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(AuthError::Internal(anyhow!("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
