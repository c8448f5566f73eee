//! Refresh-token rotation endpoint.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::warn;

use super::{
    session::{REFRESH_TOKEN_COOKIE, auth_cookie_headers, extract_token},
    state::AuthState,
    storage::rotate_refresh_token,
    tokens::TokenKind,
    types::{ApiEnvelope, TokenPairData},
};
use crate::api::error::ApiError;

#[utoipa::path(
    post,
    path = "/refresh-token",
    responses(
        (status = 200, description = "New token pair issued; cookies replaced", body = TokenPairData),
        (status = 401, description = "Missing, invalid, expired, or superseded refresh token")
    ),
    tag = "session"
)]
pub async fn refresh_token(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(presented) = extract_token(&headers, REFRESH_TOKEN_COOKIE) else {
        return Err(ApiError::Authentication(
            "Unauthorized request. No refresh token found.".to_string(),
        ));
    };

    let account_id = auth_state.codec().verify(TokenKind::Refresh, &presented)?;

    let pair = auth_state.codec().issue_pair(account_id)?;

    // Compare-and-set against the presented token. Zero rows means the
    // account is gone or the token was superseded by a newer login/refresh
    // or a logout; either way the presented token is permanently dead.
    let rotated = rotate_refresh_token(&pool, account_id, &presented, &pair.refresh).await?;
    if !rotated {
        warn!(account_id = %account_id, "stale refresh token presented");
        return Err(ApiError::Authentication(
            "Refresh token has expired.".to_string(),
        ));
    }

    let response_headers = auth_cookie_headers(&auth_state, &pair)?;
    Ok((
        StatusCode::OK,
        response_headers,
        Json(ApiEnvelope::new(
            StatusCode::OK,
            TokenPairData {
                access_token: pair.access,
                refresh_token: pair.refresh,
            },
            "Tokens refreshed successfully.",
        )),
    ))
}
