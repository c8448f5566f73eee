//! Cookie transport for the token pair, plus the logout endpoint.

use anyhow::{Context, Result};
use axum::{
    Json,
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, SET_COOKIE},
    },
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use super::{
    principal::require_auth,
    state::AuthState,
    storage::clear_refresh_token,
    tokens::TokenPair,
    types::ApiEnvelope,
};
use crate::api::error::ApiError;

pub(super) const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub(super) const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Build a secure `HttpOnly` cookie carrying one token.
fn token_cookie(name: &str, token: &str, ttl_seconds: i64, secure: bool) -> Result<HeaderValue> {
    let mut cookie =
        format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).context("failed to build token cookie")
}

fn clear_cookie(name: &str, secure: bool) -> Result<HeaderValue> {
    let mut cookie = format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).context("failed to build expired token cookie")
}

/// `Set-Cookie` headers installing a fresh token pair.
pub(super) fn auth_cookie_headers(auth_state: &AuthState, pair: &TokenPair) -> Result<HeaderMap> {
    let secure = auth_state.config().cookie_secure();
    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        token_cookie(
            ACCESS_TOKEN_COOKIE,
            &pair.access,
            auth_state.config().access_token_ttl_seconds(),
            secure,
        )?,
    );
    headers.append(
        SET_COOKIE,
        token_cookie(
            REFRESH_TOKEN_COOKIE,
            &pair.refresh,
            auth_state.config().refresh_token_ttl_seconds(),
            secure,
        )?,
    );
    Ok(headers)
}

/// `Set-Cookie` headers expiring both token cookies.
pub(super) fn clear_cookie_headers(auth_state: &AuthState) -> Result<HeaderMap> {
    let secure = auth_state.config().cookie_secure();
    let mut headers = HeaderMap::new();
    headers.append(SET_COOKIE, clear_cookie(ACCESS_TOKEN_COOKIE, secure)?);
    headers.append(SET_COOKIE, clear_cookie(REFRESH_TOKEN_COOKIE, secure)?);
    Ok(headers)
}

/// Pull a token from the named cookie, falling back to `Authorization: Bearer`.
pub(super) fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(token) = extract_cookie(headers, cookie_name) {
        return Some(token);
    }
    extract_bearer_token(headers)
}

fn extract_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == cookie_name && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Session cleared and cookies expired"),
        (status = 401, description = "Missing or invalid access token")
    ),
    tag = "session"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;

    // Unconditional clear keeps logout idempotent.
    clear_refresh_token(&pool, principal.account_id).await?;

    let response_headers = clear_cookie_headers(&auth_state)?;
    Ok((
        StatusCode::OK,
        response_headers,
        Json(ApiEnvelope::new(
            StatusCode::OK,
            json!({}),
            "User logged out successfully.",
        )),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_state(secure: bool) -> AuthState {
        AuthState::new(
            super::super::state::AuthConfig::new(
                SecretString::from("access-secret".to_string()),
                SecretString::from("refresh-secret".to_string()),
            )
            .with_cookie_secure(secure),
        )
    }

    #[test]
    fn token_cookie_carries_required_attributes() -> Result<()> {
        let cookie = token_cookie(ACCESS_TOKEN_COOKIE, "token", 900, true)?;
        let value = cookie.to_str().expect("ascii cookie");
        assert!(value.starts_with("accessToken=token"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Secure"));
        assert!(value.contains("Max-Age=900"));
        assert!(value.contains("SameSite=Lax"));
        Ok(())
    }

    #[test]
    fn insecure_config_drops_secure_attribute() -> Result<()> {
        let cookie = token_cookie(ACCESS_TOKEN_COOKIE, "token", 900, false)?;
        assert!(!cookie.to_str().expect("ascii cookie").contains("Secure"));
        Ok(())
    }

    #[test]
    fn auth_cookie_headers_set_both_tokens() -> Result<()> {
        let state = test_state(true);
        let pair = TokenPair {
            access: "access-token".to_string(),
            refresh: "refresh-token".to_string(),
        };
        let headers = auth_cookie_headers(&state, &pair)?;
        let cookies: Vec<_> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
        assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));
        Ok(())
    }

    #[test]
    fn clear_cookie_headers_expire_both_tokens() -> Result<()> {
        let state = test_state(true);
        let headers = clear_cookie_headers(&state)?;
        let cookies: Vec<_> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
        Ok(())
    }

    #[test]
    fn extract_token_prefers_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("accessToken=from-cookie; other=x"),
        );
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(
            extract_token(&headers, ACCESS_TOKEN_COOKIE),
            Some("from-cookie".to_string())
        );
    }

    #[test]
    fn extract_token_falls_back_to_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(
            extract_token(&headers, REFRESH_TOKEN_COOKIE),
            Some("from-header".to_string())
        );
    }

    #[test]
    fn extract_token_none_when_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_token(&headers, ACCESS_TOKEN_COOKIE), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_token(&headers, ACCESS_TOKEN_COOKIE), None);
    }
}
