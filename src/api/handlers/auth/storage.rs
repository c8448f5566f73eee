//! Database helpers for accounts and the session pointer.
//!
//! Every mutation of `refresh_token` is a single statement: plain overwrite on
//! login, `NULL` on logout, and a conditional compare-and-set on refresh.
//! There is never a read-modify-write across two round trips, so concurrent
//! logins/refreshes for one account cannot lose an update.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::Instrument;
use uuid::Uuid;

/// Columns safe to return to callers: no password hash, no refresh token,
/// no media public ids.
const USER_COLUMNS: &str = r#"
    id::text AS id,
    username,
    email,
    full_name,
    avatar_url,
    cover_image_url,
    to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
"#;

/// Public projection of an account row.
#[derive(Debug, Clone)]
pub(crate) struct UserRecord {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) avatar_url: String,
    pub(crate) cover_image_url: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

/// Minimal fields needed to check a login credential.
pub(crate) struct CredentialRecord {
    pub(crate) id: Uuid,
    pub(crate) password_hash: String,
}

/// Fields for a new account row; media pointers come from the upload step.
pub(crate) struct NewUser<'a> {
    pub(crate) username: &'a str,
    pub(crate) email: &'a str,
    pub(crate) full_name: &'a str,
    pub(crate) password_hash: &'a str,
    pub(crate) avatar_url: &'a str,
    pub(crate) avatar_public_id: &'a str,
    pub(crate) cover_image_url: Option<&'a str>,
    pub(crate) cover_image_public_id: Option<&'a str>,
}

/// Outcome when attempting to create a new account.
#[derive(Debug)]
pub(crate) enum InsertOutcome {
    Created(UserRecord),
    Conflict,
}

/// Outcome when attempting to update identity fields.
#[derive(Debug)]
pub(crate) enum UpdateOutcome {
    Updated(UserRecord),
    Conflict,
    Missing,
}

/// Host-side asset ids for the current profile images.
pub(crate) struct MediaIds {
    pub(crate) avatar_public_id: String,
    pub(crate) cover_image_public_id: Option<String>,
}

fn user_record(row: &PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        full_name: row.get("full_name"),
        avatar_url: row.get("avatar_url"),
        cover_image_url: row.get("cover_image_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// Check whether a username or email is already registered.
pub(crate) async fn username_or_email_taken(
    pool: &PgPool,
    username: &str,
    email: &str,
) -> Result<bool> {
    let query = "SELECT 1 FROM users WHERE username = $1 OR email = $2 LIMIT 1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check username/email uniqueness")?;
    Ok(row.is_some())
}

/// Insert a new account; the unique indexes catch races the pre-check missed.
pub(crate) async fn insert_user(pool: &PgPool, user: &NewUser<'_>) -> Result<InsertOutcome> {
    let query = format!(
        r"
        INSERT INTO users
            (username, email, full_name, password_hash,
             avatar_url, avatar_public_id, cover_image_url, cover_image_public_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
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
        .bind(user.username)
        .bind(user.email)
        .bind(user.full_name)
        .bind(user.password_hash)
        .bind(user.avatar_url)
        .bind(user.avatar_public_id)
        .bind(user.cover_image_url)
        .bind(user.cover_image_public_id)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertOutcome::Created(user_record(&row))),
        Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// Look up login data by username or email.
pub(crate) async fn find_credentials(
    pool: &PgPool,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<Option<CredentialRecord>> {
    let query = r"
        SELECT id, password_hash
        FROM users
        WHERE ($1::text IS NOT NULL AND username = $1)
           OR ($2::text IS NOT NULL AND email = $2)
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup credentials")?;

    Ok(row.map(|row| CredentialRecord {
        id: row.get("id"),
        password_hash: row.get("password_hash"),
    }))
}

/// Fetch the stored password hash for an account.
pub(crate) async fn fetch_password_hash(pool: &PgPool, account_id: Uuid) -> Result<Option<String>> {
    let query = "SELECT password_hash FROM users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(account_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch password hash")?;
    Ok(row.map(|row| row.get("password_hash")))
}

/// Fetch the public projection of an account.
pub(crate) async fn fetch_user(pool: &PgPool, account_id: Uuid) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(account_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch user")?;
    Ok(row.map(|row| user_record(&row)))
}

/// Overwrite the session pointer on login. One statement, no read first.
pub(crate) async fn store_refresh_token(
    pool: &PgPool,
    account_id: Uuid,
    refresh_token: &str,
) -> Result<()> {
    let query = "UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .bind(refresh_token)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to store refresh token")?;
    Ok(())
}

/// Clear the session pointer. Idempotent; clearing twice is harmless.
pub(crate) async fn clear_refresh_token(pool: &PgPool, account_id: Uuid) -> Result<()> {
    let query = "UPDATE users SET refresh_token = NULL, updated_at = NOW() WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to clear refresh token")?;
    Ok(())
}

/// Rotate the session pointer only if the presented token is still current.
///
/// Returns `false` when the account does not exist or the stored pointer no
/// longer matches, which covers reuse of a superseded or logged-out token.
pub(crate) async fn rotate_refresh_token(
    pool: &PgPool,
    account_id: Uuid,
    presented: &str,
    replacement: &str,
) -> Result<bool> {
    let query = r"
        UPDATE users
        SET refresh_token = $3, updated_at = NOW()
        WHERE id = $1 AND refresh_token = $2
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(account_id)
        .bind(presented)
        .bind(replacement)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to rotate refresh token")?;
    Ok(result.rows_affected() > 0)
}

/// Persist a new password hash. The session pointer is left untouched.
pub(crate) async fn update_password_hash(
    pool: &PgPool,
    account_id: Uuid,
    password_hash: &str,
) -> Result<()> {
    let query = "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update password hash")?;
    Ok(())
}

/// Update the identity fields of an account.
pub(crate) async fn update_profile(
    pool: &PgPool,
    account_id: Uuid,
    username: &str,
    email: &str,
    full_name: &str,
) -> Result<UpdateOutcome> {
    let query = format!(
        r"
        UPDATE users
        SET username = $2, email = $3, full_name = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(account_id)
        .bind(username)
        .bind(email)
        .bind(full_name)
        .fetch_optional(pool)
        .instrument(span)
        .await;

    match row {
        Ok(Some(row)) => Ok(UpdateOutcome::Updated(user_record(&row))),
        Ok(None) => Ok(UpdateOutcome::Missing),
        Err(err) if is_unique_violation(&err) => Ok(UpdateOutcome::Conflict),
        Err(err) => Err(err).context("failed to update profile"),
    }
}

/// Fetch the media host ids of the current profile images.
pub(crate) async fn fetch_media_ids(pool: &PgPool, account_id: Uuid) -> Result<Option<MediaIds>> {
    let query = "SELECT avatar_public_id, cover_image_public_id FROM users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(account_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch media ids")?;
    Ok(row.map(|row| MediaIds {
        avatar_public_id: row.get("avatar_public_id"),
        cover_image_public_id: row.get("cover_image_public_id"),
    }))
}

/// Point the account at a freshly uploaded avatar.
pub(crate) async fn update_avatar(
    pool: &PgPool,
    account_id: Uuid,
    url: &str,
    public_id: &str,
) -> Result<Option<UserRecord>> {
    let query = format!(
        r"
        UPDATE users
        SET avatar_url = $2, avatar_public_id = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(account_id)
        .bind(url)
        .bind(public_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update avatar")?;
    Ok(row.map(|row| user_record(&row)))
}

/// Point the account at a freshly uploaded cover image.
pub(crate) async fn update_cover_image(
    pool: &PgPool,
    account_id: Uuid,
    url: &str,
    public_id: &str,
) -> Result<Option<UserRecord>> {
    let query = format!(
        r"
        UPDATE users
        SET cover_image_url = $2, cover_image_public_id = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(account_id)
        .bind(url)
        .bind(public_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update cover image")?;
    Ok(row.map(|row| user_record(&row)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_columns_exclude_sensitive_fields() {
        assert!(!USER_COLUMNS.contains("password_hash"));
        assert!(!USER_COLUMNS.contains("refresh_token"));
        assert!(!USER_COLUMNS.contains("public_id"));
    }

    #[test]
    fn insert_outcome_debug_names() {
        assert_eq!(format!("{:?}", InsertOutcome::Conflict), "Conflict");
    }

    #[test]
    fn update_outcome_debug_names() {
        assert_eq!(format!("{:?}", UpdateOutcome::Conflict), "Conflict");
        assert_eq!(format!("{:?}", UpdateOutcome::Missing), "Missing");
    }

    #[test]
    fn unique_violation_requires_database_error() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
