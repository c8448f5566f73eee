//! Authenticated self-service profile endpoints.
//!
//! Flow Overview:
//! 1) Authenticate via the access-token gate.
//! 2) Read or update the account row.
//! 3) Return the sanitized projection.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;

use super::{
    auth::{
        principal::require_auth,
        state::AuthState,
        storage::{UpdateOutcome, update_profile},
        types::{ApiEnvelope, UpdateUserInfoRequest, UserResponse},
    },
    valid_email,
};
use crate::api::error::ApiError;

#[utoipa::path(
    get,
    path = "/get-current-user",
    responses(
        (status = 200, description = "Authenticated account", body = UserResponse),
        (status = 401, description = "Missing or invalid access token")
    ),
    tag = "profile"
)]
pub async fn get_current_user(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;

    Ok((
        StatusCode::OK,
        Json(ApiEnvelope::new(
            StatusCode::OK,
            UserResponse::from(principal.user),
            "Current user fetched successfully.",
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/update-user-info",
    request_body = UpdateUserInfoRequest,
    responses(
        (status = 200, description = "Identity fields updated", body = UserResponse),
        (status = 400, description = "Empty fields or malformed email"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 409, description = "Username or email already taken")
    ),
    tag = "profile"
)]
pub async fn update_user_info(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<UpdateUserInfoRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload.".to_string()));
    };

    let username = request.username.trim().to_lowercase();
    let email = request.email.trim().to_string();
    let fullname = request.fullname.trim().to_string();

    if username.is_empty() || email.is_empty() || fullname.is_empty() {
        return Err(ApiError::Validation(
            "Please provide non-empty fields to update.".to_string(),
        ));
    }
    if !valid_email(&email) {
        return Err(ApiError::Validation("Enter a valid email.".to_string()));
    }

    match update_profile(&pool, principal.account_id, &username, &email, &fullname).await? {
        UpdateOutcome::Updated(record) => Ok((
            StatusCode::OK,
            Json(ApiEnvelope::new(
                StatusCode::OK,
                UserResponse::from(record),
                "User data updated successfully.",
            )),
        )),
        UpdateOutcome::Conflict => Err(ApiError::Conflict(
            "User with the same email or username already exists.".to_string(),
        )),
        UpdateOutcome::Missing => Err(ApiError::NotFound("User not found.".to_string())),
    }
}
