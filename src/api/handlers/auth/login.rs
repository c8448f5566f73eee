//! Credential login endpoint.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use super::{
    hasher::verify_password,
    session::auth_cookie_headers,
    state::AuthState,
    storage::{fetch_user, find_credentials, store_refresh_token},
    types::{ApiEnvelope, LoginData, LoginRequest, UserResponse},
};
use crate::api::error::ApiError;

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; token cookies set", body = LoginData),
        (status = 400, description = "Missing identifier"),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "No matching account")
    ),
    tag = "session"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload.".to_string()));
    };

    let username = normalize_identifier(request.username.as_deref()).map(|name| name.to_lowercase());
    let email = normalize_identifier(request.email.as_deref());

    if username.is_none() && email.is_none() {
        return Err(ApiError::Validation(
            "Enter a valid username or email.".to_string(),
        ));
    }

    let credentials = find_credentials(&pool, username.as_deref(), email.as_deref())
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("User with the given username or email was not found.".to_string())
        })?;

    if !verify_password(&request.password, &credentials.password_hash) {
        return Err(ApiError::Authentication("Incorrect password.".to_string()));
    }

    let pair = auth_state.codec().issue_pair(credentials.id)?;

    // Single-statement overwrite: the previous refresh token is revoked the
    // moment this lands, giving each account one active session.
    store_refresh_token(&pool, credentials.id, &pair.refresh).await?;

    let user = fetch_user(&pool, credentials.id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("account disappeared during login")))?;

    info!(username = %user.username, "user logged in");

    let headers = auth_cookie_headers(&auth_state, &pair)?;
    Ok((
        StatusCode::OK,
        headers,
        Json(ApiEnvelope::new(
            StatusCode::OK,
            LoginData {
                user: UserResponse::from(user),
                access_token: pair.access,
                refresh_token: pair.refresh,
            },
            "User logged in successfully.",
        )),
    ))
}

fn normalize_identifier(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::normalize_identifier;

    #[test]
    fn normalize_identifier_trims_and_drops_empty() {
        assert_eq!(normalize_identifier(Some(" alice ")), Some("alice".to_string()));
        assert_eq!(normalize_identifier(Some("   ")), None);
        assert_eq!(normalize_identifier(Some("")), None);
        assert_eq!(normalize_identifier(None), None);
    }
}
