//! Profile image replacement endpoints.
//!
//! Replacing an image is upload-first: the new asset goes to the media host,
//! the previous asset is deleted, then the account row is pointed at the new
//! URL/public id.

use axum::{
    Json,
    extract::{Extension, Multipart},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;

use super::auth::{
    principal::require_auth,
    register::{UploadField, read_file},
    state::AuthState,
    storage::{fetch_media_ids, update_avatar, update_cover_image},
    types::{ApiEnvelope, UserResponse},
};
use crate::{api::error::ApiError, media::MediaClient};

/// Read the single file out of a multipart body, whatever its field name.
async fn read_single_file(
    multipart: &mut Multipart,
    fallback_name: &str,
) -> Result<Option<UploadField>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Validation(format!("Invalid multipart payload: {err}")))?
    {
        if field.file_name().is_some() || field.name().is_some() {
            return Ok(Some(read_file(field, fallback_name).await?));
        }
    }
    Ok(None)
}

#[utoipa::path(
    put,
    path = "/update-user-avatar",
    responses(
        (status = 200, description = "Avatar replaced", body = UserResponse),
        (status = 400, description = "No image in the request"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 500, description = "Media host upload or delete failed")
    ),
    tag = "profile"
)]
pub async fn update_user_avatar(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    media: Extension<Arc<MediaClient>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;

    let Some(upload) = read_single_file(&mut multipart, "avatar").await? else {
        return Err(ApiError::Validation("Avatar image is required.".to_string()));
    };

    let uploaded = media.upload_image(&upload.file_name, upload.bytes).await?;

    let media_ids = fetch_media_ids(&pool, principal.account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;
    media
        .delete_image(&media_ids.avatar_public_id)
        .await
        .map_err(|_| ApiError::Upload("Failed to delete the previous avatar image.".to_string()))?;

    let record = update_avatar(&pool, principal.account_id, &uploaded.url, &uploaded.public_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    Ok((
        StatusCode::OK,
        Json(ApiEnvelope::new(
            StatusCode::OK,
            UserResponse::from(record),
            "Avatar image updated successfully.",
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/update-user-cover-image",
    responses(
        (status = 200, description = "Cover image replaced", body = UserResponse),
        (status = 400, description = "No image in the request"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 500, description = "Media host upload or delete failed")
    ),
    tag = "profile"
)]
pub async fn update_user_cover_image(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    media: Extension<Arc<MediaClient>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;

    let Some(upload) = read_single_file(&mut multipart, "coverImage").await? else {
        return Err(ApiError::Validation("Cover image is required.".to_string()));
    };

    let uploaded = media.upload_image(&upload.file_name, upload.bytes).await?;

    let media_ids = fetch_media_ids(&pool, principal.account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;
    // First-time covers have nothing to delete.
    if let Some(previous) = media_ids.cover_image_public_id.as_deref() {
        media.delete_image(previous).await.map_err(|_| {
            ApiError::Upload("Failed to delete the previous cover image.".to_string())
        })?;
    }

    let record = update_cover_image(&pool, principal.account_id, &uploaded.url, &uploaded.public_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    Ok((
        StatusCode::OK,
        Json(ApiEnvelope::new(
            StatusCode::OK,
            UserResponse::from(record),
            "Cover image updated successfully.",
        )),
    ))
}
