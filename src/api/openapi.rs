use utoipa::OpenApi;

use super::handlers::auth::types::{
    AckResponse, AuthResponse, OtpVerifyRequest, ResendOtpRequest, Role, SigninRequest,
    SignupRequest, TokenPair, UserResponse,
};
use super::handlers::users::{DeleteResponse, ProfileResponse, UserUpdateRequest};
use super::handlers::{auth, health, users};

/// OpenAPI document for all served routes.
///
/// Add new endpoints here and in [`super::router`] so they are both served
/// and documented. Routes added outside (like `/`) are intentionally not
/// documented.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::signup::signup,
        auth::signin::signin,
        auth::verification::otp_verify,
        auth::verification::resend_otp,
        users::list_users,
        users::get_profile,
        users::get_user,
        users::patch_user,
        users::delete_user,
    ),
    components(schemas(
        SignupRequest,
        SigninRequest,
        OtpVerifyRequest,
        ResendOtpRequest,
        AckResponse,
        AuthResponse,
        TokenPair,
        UserResponse,
        Role,
        UserUpdateRequest,
        ProfileResponse,
        DeleteResponse,
        health::Health,
    )),
    tags(
        (name = "auth", description = "Signup, signin, and OTP verification"),
        (name = "users", description = "Role-based user management"),
        (name = "health", description = "Service health"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn openapi_tags_and_paths() {
        let spec = openapi();
        let tags = spec.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "auth"));
        assert!(tags.iter().any(|tag| tag.name == "users"));

        assert!(spec.paths.paths.contains_key("/auth/signup"));
        assert!(spec.paths.paths.contains_key("/auth/signin"));
        assert!(spec.paths.paths.contains_key("/auth/otp-verify"));
        assert!(spec.paths.paths.contains_key("/auth/resend-otp"));
        assert!(spec.paths.paths.contains_key("/users"));
        assert!(spec.paths.paths.contains_key("/users/profile"));
        assert!(spec.paths.paths.contains_key("/users/{id}"));
        assert!(spec.paths.paths.contains_key("/health"));
    }
}
