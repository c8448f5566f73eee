//! Password change endpoint.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use super::{
    hasher::{PASSWORD_POLICY_MESSAGE, hash_password, valid_password, verify_password},
    principal::require_auth,
    state::AuthState,
    storage::{fetch_password_hash, update_password_hash},
    types::{ApiEnvelope, ChangePasswordRequest},
};
use crate::api::error::ApiError;

#[utoipa::path(
    post,
    path = "/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Empty fields or weak new password"),
        (status = 401, description = "Missing session or wrong old password")
    ),
    tag = "accounts"
)]
pub async fn change_password(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload.".to_string()));
    };

    let old_password = request.old_password.trim();
    let new_password = request.new_password.trim();
    if old_password.is_empty() || new_password.is_empty() {
        return Err(ApiError::Validation(
            "Empty password fields. Provide valid passwords.".to_string(),
        ));
    }
    if !valid_password(new_password) {
        return Err(ApiError::Validation(PASSWORD_POLICY_MESSAGE.to_string()));
    }

    let stored_hash = fetch_password_hash(&pool, principal.account_id)
        .await?
        .ok_or_else(|| ApiError::Authentication("Invalid access token.".to_string()))?;

    if !verify_password(old_password, &stored_hash) {
        return Err(ApiError::Authentication("Invalid old password.".to_string()));
    }

    let new_hash = hash_password(new_password)?;
    // Only the hash changes; the current refresh token stays valid, so the
    // active session survives a password change.
    update_password_hash(&pool, principal.account_id, &new_hash).await?;

    info!(username = %principal.user.username, "password changed");

    Ok((
        StatusCode::OK,
        Json(ApiEnvelope::new(
            StatusCode::OK,
            json!({}),
            "Password changed successfully.",
        )),
    ))
}
