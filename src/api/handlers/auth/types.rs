//! Request/response types for auth endpoints.
//!
//! The wire format is camelCase end to end; internal field names stay
//! snake_case.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User capability level, stored as plain data on the user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse the stored/wire representation; anything else is rejected.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::User
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OtpVerifyRequest {
    pub email: String,
    pub otp: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResendOtpRequest {
    pub email: String,
}

/// Acknowledgement for flows that end with an email in flight, not tokens.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AckResponse {
    pub message: String,
    pub email: String,
}

/// Signed access/refresh pair returned on successful authentication.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Public view of a user record; never carries hashes or OTP state.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub is_active: bool,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub tokens: TokenPair,
}
