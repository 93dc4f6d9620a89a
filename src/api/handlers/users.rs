//! Role-based user management endpoints.
//!
//! Flow Overview:
//! 1) Authenticate the request via bearer access token.
//! 2) Enforce the self-or-admin policy on the target record.
//! 3) Perform the read, allow-listed update, or delete.

use anyhow::{anyhow, Context, Result};
use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::auth::error::AuthError;
use super::auth::principal::{require_auth, Principal};
use super::auth::types::{Role, UserResponse};
use super::auth::AuthState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "List all users (admin only).", body = [UserResponse]),
        (status = 401, description = "Missing or invalid access token."),
        (status = 403, description = "Forbidden."),
    ),
    tag = "users"
)]
pub async fn list_users(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };
    if !principal.is_admin() {
        return AuthError::Forbidden.into_response();
    }

    match fetch_all_users(&pool).await {
        Ok(list) => (StatusCode::OK, Json(list)).into_response(),
        Err(err) => {
            error!("Failed to list users: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/users/profile",
    responses(
        (status = 200, description = "Return the authenticated user's record.", body = ProfileResponse),
        (status = 401, description = "Missing or invalid access token."),
        (status = 404, description = "User not found."),
    ),
    tag = "users"
)]
pub async fn get_profile(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    match fetch_user(&pool, principal.user_id).await {
        Ok(Some(user)) => {
            let response = ProfileResponse {
                message: "Success".to_string(),
                user,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(None) => AuthError::NotFound.into_response(),
        Err(err) => {
            error!("Failed to fetch profile: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User record (self or admin).", body = UserResponse),
        (status = 401, description = "Missing or invalid access token."),
        (status = 403, description = "Forbidden."),
        (status = 404, description = "User not found."),
    ),
    tag = "users"
)]
pub async fn get_user(
    Path(id): Path<i64>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };
    if let Err(err) = ensure_can_access(&principal, id) {
        return err.into_response();
    }

    match fetch_user(&pool, id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(user)).into_response(),
        Ok(None) => AuthError::NotFound.into_response(),
        Err(err) => {
            error!("Failed to fetch user: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    params(
        ("id" = i64, Path, description = "User id")
    ),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "User updated (self or admin).", body = UserResponse),
        (status = 400, description = "Invalid input."),
        (status = 401, description = "Missing or invalid access token."),
        (status = 403, description = "Forbidden."),
        (status = 404, description = "User not found."),
    ),
    tag = "users"
)]
pub async fn patch_user(
    Path(id): Path<i64>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    payload: Option<Json<UserUpdateRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };
    if let Err(err) = ensure_can_access(&principal, id) {
        return err.into_response();
    }

    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let first_name = normalize_optional(payload.first_name);
    let last_name = normalize_optional(payload.last_name);
    let role = match payload.role {
        Some(role) => match Role::parse(role.trim()) {
            Some(role) => Some(role),
            None => return AuthError::Validation("Invalid role").into_response(),
        },
        None => None,
    };

    if first_name.is_none() && last_name.is_none() && role.is_none() {
        return AuthError::Validation("No updates provided.").into_response();
    }

    match update_user(&pool, id, first_name, last_name, role).await {
        Ok(Some(user)) => (StatusCode::OK, Json(user)).into_response(),
        Ok(None) => AuthError::NotFound.into_response(),
        Err(err) => {
            error!("Failed to update user: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(
        ("id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User deleted (self or admin).", body = DeleteResponse),
        (status = 401, description = "Missing or invalid access token."),
        (status = 403, description = "Forbidden."),
        (status = 404, description = "User not found."),
    ),
    tag = "users"
)]
pub async fn delete_user(
    Path(id): Path<i64>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };
    if let Err(err) = ensure_can_access(&principal, id) {
        return err.into_response();
    }

    match delete_user_record(&pool, id).await {
        Ok(true) => {
            let response = DeleteResponse {
                message: "User deleted successfully".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(false) => AuthError::NotFound.into_response(),
        Err(err) => {
            error!("Failed to delete user: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn ensure_can_access(principal: &Principal, target_id: i64) -> Result<(), AuthError> {
    if principal.can_access(target_id) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

const USER_COLUMNS: &str = r#"
    id, first_name, last_name, email, is_active, role,
    to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
"#;

fn map_user(row: &sqlx::postgres::PgRow) -> Result<UserResponse> {
    let role: String = row.get("role");
    let role = Role::parse(&role).ok_or_else(|| anyhow!("unknown role stored: {role}"))?;
    Ok(UserResponse {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        is_active: row.get("is_active"),
        role,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

async fn fetch_all_users(pool: &PgPool) -> Result<Vec<UserResponse>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .context("failed to list users")?;
    rows.iter().map(map_user).collect()
}

async fn fetch_user(pool: &PgPool, user_id: i64) -> Result<Option<UserResponse>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let row = sqlx::query(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user")?;
    row.as_ref().map(map_user).transpose()
}

async fn update_user(
    pool: &PgPool,
    user_id: i64,
    first_name: Option<String>,
    last_name: Option<String>,
    role: Option<Role>,
) -> Result<Option<UserResponse>> {
    let query = format!(
        r"
        UPDATE users
        SET
            first_name = COALESCE($1, first_name),
            last_name = COALESCE($2, last_name),
            role = COALESCE($3, role),
            updated_at = NOW()
        WHERE id = $4
        RETURNING {USER_COLUMNS}
    "
    );
    let row = sqlx::query(&query)
        .bind(first_name)
        .bind(last_name)
        .bind(role.map(Role::as_str))
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to update user")?;
    row.as_ref().map(map_user).transpose()
}

async fn delete_user_record(pool: &PgPool, user_id: i64) -> Result<bool> {
    let query = "DELETE FROM users WHERE id = $1";
    let result = sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .await
        .context("failed to delete user")?;
    Ok(result.rows_affected() > 0)
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::super::auth::test_support::{auth_state, test_pool};
    use super::*;
    use anyhow::Result;

    #[test]
    fn normalize_optional_drops_blank_values() {
        assert_eq!(normalize_optional(Some("  ".to_string())), None);
        assert_eq!(
            normalize_optional(Some(" Alice ".to_string())),
            Some("Alice".to_string())
        );
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn policy_rejects_other_users_for_non_admins() {
        let actor = Principal {
            user_id: 1,
            email: "user@example.com".to_string(),
            role: Role::User,
        };
        assert!(ensure_can_access(&actor, 1).is_ok());
        assert!(ensure_can_access(&actor, 2).is_err());

        let admin = Principal {
            user_id: 1,
            email: "admin@example.com".to_string(),
            role: Role::Admin,
        };
        assert!(ensure_can_access(&admin, 2).is_ok());
    }

    #[tokio::test]
    async fn list_users_requires_token() -> Result<()> {
        let response = list_users(
            HeaderMap::new(),
            Extension(auth_state()),
            Extension(test_pool()?),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn get_user_requires_token() -> Result<()> {
        let response = get_user(
            Path(1),
            HeaderMap::new(),
            Extension(auth_state()),
            Extension(test_pool()?),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn patch_user_requires_token() -> Result<()> {
        let response = patch_user(
            Path(1),
            HeaderMap::new(),
            Extension(auth_state()),
            Extension(test_pool()?),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }
}
