//! Registration endpoint: multipart form with profile images.

use axum::{
    Json,
    extract::{Extension, Multipart},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use super::{
    hasher::{PASSWORD_POLICY_MESSAGE, hash_password, valid_password},
    storage::{InsertOutcome, NewUser, insert_user, username_or_email_taken},
    types::{ApiEnvelope, UserResponse},
};
use crate::{
    api::{error::ApiError, handlers::valid_email},
    media::{MediaClient, UploadedImage},
};

/// One uploaded file from the multipart form.
pub(crate) struct UploadField {
    pub(crate) file_name: String,
    pub(crate) bytes: Vec<u8>,
}

#[derive(Default)]
struct RegisterForm {
    username: String,
    email: String,
    fullname: String,
    password: String,
    avatar: Option<UploadField>,
    cover_image: Option<UploadField>,
}

async fn read_form(multipart: &mut Multipart) -> Result<RegisterForm, ApiError> {
    let mut form = RegisterForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Validation(format!("Invalid multipart payload: {err}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("username") => form.username = read_text(field).await?,
            Some("email") => form.email = read_text(field).await?,
            Some("fullname") => form.fullname = read_text(field).await?,
            Some("password") => form.password = read_text(field).await?,
            Some("avatar") => form.avatar = Some(read_file(field, "avatar").await?),
            Some("coverImage") => form.cover_image = Some(read_file(field, "coverImage").await?),
            // Unknown fields are ignored rather than rejected.
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|err| ApiError::Validation(format!("Invalid multipart payload: {err}")))
}

pub(crate) async fn read_file(
    field: axum::extract::multipart::Field<'_>,
    fallback_name: &str,
) -> Result<UploadField, ApiError> {
    let file_name = field
        .file_name()
        .unwrap_or(fallback_name)
        .to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|err| ApiError::Validation(format!("Invalid multipart payload: {err}")))?;
    Ok(UploadField {
        file_name,
        bytes: bytes.to_vec(),
    })
}

#[utoipa::path(
    post,
    path = "/register",
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Missing or malformed fields"),
        (status = 409, description = "Username or email already registered"),
        (status = 500, description = "Avatar upload failed")
    ),
    tag = "accounts"
)]
pub async fn register(
    pool: Extension<PgPool>,
    media: Extension<Arc<MediaClient>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_form(&mut multipart).await?;

    let username = form.username.trim().to_lowercase();
    let email = form.email.trim().to_string();
    let fullname = form.fullname.trim().to_string();
    let password = form.password.trim().to_string();

    if username.is_empty() || email.is_empty() || fullname.is_empty() || password.is_empty() {
        return Err(ApiError::Validation("All fields are required.".to_string()));
    }
    if !valid_email(&email) {
        return Err(ApiError::Validation("Enter a valid email.".to_string()));
    }
    if !valid_password(&password) {
        return Err(ApiError::Validation(PASSWORD_POLICY_MESSAGE.to_string()));
    }

    // Cheap uniqueness probe before paying for uploads; the insert below
    // still catches the losing side of a race.
    if username_or_email_taken(&pool, &username, &email).await? {
        return Err(ApiError::Conflict(
            "User with the same email or username already exists.".to_string(),
        ));
    }

    let Some(avatar) = form.avatar else {
        return Err(ApiError::Validation("Avatar image is required.".to_string()));
    };
    let avatar: UploadedImage = media.upload_image(&avatar.file_name, avatar.bytes).await?;

    let cover_image = match form.cover_image {
        Some(upload) => Some(media.upload_image(&upload.file_name, upload.bytes).await?),
        None => None,
    };

    let password_hash = hash_password(&password)?;
    let outcome = insert_user(
        &pool,
        &NewUser {
            username: &username,
            email: &email,
            full_name: &fullname,
            password_hash: &password_hash,
            avatar_url: &avatar.url,
            avatar_public_id: &avatar.public_id,
            cover_image_url: cover_image.as_ref().map(|image| image.url.as_str()),
            cover_image_public_id: cover_image.as_ref().map(|image| image.public_id.as_str()),
        },
    )
    .await?;

    match outcome {
        InsertOutcome::Created(record) => {
            info!(username = %record.username, "account created");
            Ok((
                StatusCode::CREATED,
                Json(ApiEnvelope::new(
                    StatusCode::CREATED,
                    UserResponse::from(record),
                    "User created successfully.",
                )),
            ))
        }
        // Uploaded assets are not cleaned up here; orphaned uploads are a
        // known gap of the registration flow.
        InsertOutcome::Conflict => Err(ApiError::Conflict(
            "User with the same email or username already exists.".to_string(),
        )),
    }
}
