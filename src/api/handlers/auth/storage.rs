//! Database helpers for the credential store.
//!
//! Expiry checks and timestamp formatting happen in SQL (`NOW()`,
//! `to_char`), so rows come back ready for the wire. The OTP hash and its
//! expiry are always written and cleared together.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::otp::OTP_TTL_SECONDS;
use super::types::{Role, UserResponse};
use super::utils::is_unique_violation;

/// Outcome when attempting to create a new user with a pending challenge.
#[derive(Debug)]
pub(super) enum SignupOutcome {
    Created(UserRow),
    Conflict,
}

/// Fields persisted for a new account.
#[derive(Debug)]
pub(super) struct NewUser {
    pub(super) first_name: String,
    pub(super) last_name: Option<String>,
    pub(super) email: String,
    pub(super) password_hash: String,
    pub(super) otp_hash: String,
}

/// A user row with challenge state resolved against the database clock.
#[derive(Debug)]
pub(super) struct UserRow {
    pub(super) id: i64,
    pub(super) first_name: String,
    pub(super) last_name: Option<String>,
    pub(super) email: String,
    pub(super) password_hash: String,
    pub(super) is_active: bool,
    pub(super) role: String,
    pub(super) mfa_email_verified: bool,
    pub(super) mfa_otp_hash: Option<String>,
    pub(super) mfa_otp_expires_at: Option<String>,
    /// True when an expiry is stored and the database clock has passed it.
    pub(super) otp_expired: bool,
    pub(super) created_at: String,
    pub(super) updated_at: String,
}

impl UserRow {
    /// Public view of the row; `None` when the stored role is outside the
    /// known set, which callers treat as data corruption.
    pub(super) fn to_response(&self) -> Option<UserResponse> {
        Some(UserResponse {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            is_active: self.is_active,
            role: Role::parse(&self.role)?,
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        })
    }
}

const USER_COLUMNS: &str = r#"
    id, first_name, last_name, email, password_hash, is_active, role,
    mfa_email_verified, mfa_otp_hash,
    to_char(mfa_otp_expires_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS mfa_otp_expires_at,
    (mfa_otp_expires_at IS NOT NULL AND mfa_otp_expires_at <= NOW()) AS otp_expired,
    to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
"#;

fn map_user(row: &sqlx::postgres::PgRow) -> UserRow {
    UserRow {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        role: row.get("role"),
        mfa_email_verified: row.get("mfa_email_verified"),
        mfa_otp_hash: row.get("mfa_otp_hash"),
        mfa_otp_expires_at: row.get("mfa_otp_expires_at"),
        otp_expired: row.get("otp_expired"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Look up a user by normalized email.
pub(super) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by email")?;

    Ok(row.as_ref().map(map_user))
}

/// Insert a new pending-verification user together with its first challenge.
///
/// The unique constraint on `email` is the authoritative duplicate signal; a
/// SQLSTATE 23505 violation maps to [`SignupOutcome::Conflict`] instead of an
/// error.
pub(super) async fn insert_user(pool: &PgPool, user: NewUser) -> Result<SignupOutcome> {
    let query = format!(
        r"
        INSERT INTO users
            (first_name, last_name, email, password_hash, mfa_otp_hash, mfa_otp_expires_at)
        VALUES ($1, $2, $3, $4, $5, NOW() + ($6 * INTERVAL '1 second'))
        RETURNING {USER_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.otp_hash)
        .bind(OTP_TTL_SECONDS)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(SignupOutcome::Created(map_user(&row))),
        Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// Overwrite the pending challenge; issuing a new code replaces the old one
/// and extends the expiry.
pub(super) async fn store_otp_challenge(pool: &PgPool, user_id: i64, otp_hash: &str) -> Result<()> {
    let query = r"
        UPDATE users
        SET mfa_otp_hash = $2,
            mfa_otp_expires_at = NOW() + ($3 * INTERVAL '1 second'),
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(otp_hash)
        .bind(OTP_TTL_SECONDS)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to store OTP challenge")?;
    Ok(())
}

/// Clear the challenge and mark the email verified in one atomic update.
pub(super) async fn mark_email_verified(pool: &PgPool, user_id: i64) -> Result<()> {
    let query = r"
        UPDATE users
        SET mfa_email_verified = TRUE,
            mfa_otp_hash = NULL,
            mfa_otp_expires_at = NULL,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to mark email verified")?;
    Ok(())
}

/// Store the hash of the latest refresh token; the previous one is revoked
/// by the overwrite.
pub(super) async fn store_refresh_token_hash(
    pool: &PgPool,
    user_id: i64,
    refresh_token_hash: &str,
) -> Result<()> {
    let query = r"
        UPDATE users
        SET refresh_token_hash = $2,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(refresh_token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to store refresh token hash")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{NewUser, SignupOutcome, UserRow};

    fn user_row() -> UserRow {
        UserRow {
            id: 1,
            first_name: "Alice".to_string(),
            last_name: None,
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            is_active: true,
            role: "user".to_string(),
            mfa_email_verified: false,
            mfa_otp_hash: Some("$argon2id$otp".to_string()),
            mfa_otp_expires_at: Some("2026-01-01T00:00:00Z".to_string()),
            otp_expired: false,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn signup_outcome_debug_names() {
        assert!(format!("{:?}", SignupOutcome::Created(user_row())).starts_with("Created"));
        assert_eq!(format!("{:?}", SignupOutcome::Conflict), "Conflict");
    }

    #[test]
    fn new_user_holds_values() {
        let user = NewUser {
            first_name: "Alice".to_string(),
            last_name: Some("Doe".to_string()),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            otp_hash: "$argon2id$otp".to_string(),
        };
        assert_eq!(user.first_name, "Alice");
        assert_eq!(user.last_name.as_deref(), Some("Doe"));
        assert_eq!(user.email, "alice@example.com");
    }
}
