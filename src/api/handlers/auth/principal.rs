//! Access-token authentication gate for protected endpoints.
//!
//! Flow Overview: read the access token from cookie or bearer header, verify
//! it, resolve the account, and hand downstream handlers a principal with the
//! sanitized account record as request context.

use axum::http::HeaderMap;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    session::{ACCESS_TOKEN_COOKIE, extract_token},
    state::AuthState,
    storage::{UserRecord, fetch_user},
    tokens::TokenKind,
};
use crate::api::error::ApiError;

/// Authenticated account context derived from the access token.
#[derive(Debug, Clone)]
pub(crate) struct Principal {
    pub(crate) account_id: Uuid,
    pub(crate) user: UserRecord,
}

/// Resolve the access token into a principal, or fail with 401.
pub(crate) async fn require_auth(
    headers: &HeaderMap,
    pool: &PgPool,
    auth_state: &AuthState,
) -> Result<Principal, ApiError> {
    let Some(token) = extract_token(headers, ACCESS_TOKEN_COOKIE) else {
        return Err(ApiError::Authentication("Unauthorized request.".to_string()));
    };

    let account_id = auth_state.codec().verify(TokenKind::Access, &token)?;

    let user = fetch_user(pool, account_id)
        .await?
        .ok_or_else(|| ApiError::Authentication("Invalid access token.".to_string()))?;

    Ok(Principal { account_id, user })
}
