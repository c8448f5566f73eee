//! Request/response types for account and session endpoints.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::storage::UserRecord;

/// Success envelope: `{status, data, message, success}`.
#[derive(Serialize, Debug)]
pub struct ApiEnvelope<T> {
    pub status: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiEnvelope<T> {
    pub(crate) fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Account projection returned to callers. The password hash, refresh token,
/// and media public ids never appear here.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub avatar: String,
    #[serde(rename = "coverImage", skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            fullname: record.full_name,
            avatar: record.avatar_url,
            cover_image: record.cover_image_url,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct LoginData {
    pub user: UserResponse,
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct TokenPairData {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ChangePasswordRequest {
    #[serde(rename = "oldPassword")]
    pub old_password: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UpdateUserInfoRequest {
    pub username: String,
    pub email: String,
    pub fullname: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    fn sample_record() -> UserRecord {
        UserRecord {
            id: "6a3a7a4e-8c62-4b0a-9f64-6f8f5b1f2a11".to_string(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            full_name: "Alice Example".to_string(),
            avatar_url: "https://res.example.com/avatars/alice.png".to_string(),
            cover_image_url: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn user_response_never_carries_secrets() -> Result<()> {
        let response = UserResponse::from(sample_record());
        let value = serde_json::to_value(&response)?;
        let object = value.as_object().context("expected object")?;
        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("passwordHash"));
        assert!(!object.contains_key("refreshToken"));
        assert!(!object.contains_key("avatarPublicId"));
        assert_eq!(
            object.get("username").and_then(serde_json::Value::as_str),
            Some("alice")
        );
        Ok(())
    }

    #[test]
    fn user_response_omits_missing_cover_image() -> Result<()> {
        let response = UserResponse::from(sample_record());
        let value = serde_json::to_value(&response)?;
        assert!(value.get("coverImage").is_none());
        Ok(())
    }

    #[test]
    fn envelope_shape_matches_contract() -> Result<()> {
        let envelope = ApiEnvelope::new(
            StatusCode::CREATED,
            UserResponse::from(sample_record()),
            "User created successfully.",
        );
        let value = serde_json::to_value(&envelope)?;
        assert_eq!(
            value.get("status").and_then(serde_json::Value::as_u64),
            Some(201)
        );
        assert_eq!(
            value.get("success").and_then(serde_json::Value::as_bool),
            Some(true)
        );
        assert_eq!(
            value.get("message").and_then(serde_json::Value::as_str),
            Some("User created successfully.")
        );
        assert!(value.get("data").is_some());
        Ok(())
    }

    #[test]
    fn login_request_accepts_either_identifier() -> Result<()> {
        let by_username: LoginRequest =
            serde_json::from_str(r#"{"username":"alice","password":"Abcdef1!"}"#)?;
        assert_eq!(by_username.username.as_deref(), Some("alice"));
        assert!(by_username.email.is_none());

        let by_email: LoginRequest =
            serde_json::from_str(r#"{"email":"a@x.com","password":"Abcdef1!"}"#)?;
        assert!(by_email.username.is_none());
        assert_eq!(by_email.email.as_deref(), Some("a@x.com"));
        Ok(())
    }

    #[test]
    fn change_password_request_uses_camel_case() -> Result<()> {
        let request: ChangePasswordRequest =
            serde_json::from_str(r#"{"oldPassword":"Abcdef1!","newPassword":"Ghijkl2@"}"#)?;
        assert_eq!(request.old_password, "Abcdef1!");
        assert_eq!(request.new_password, "Ghijkl2@");
        Ok(())
    }

    #[test]
    fn token_pair_serializes_camel_case() -> Result<()> {
        let data = TokenPairData {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
        };
        let value = serde_json::to_value(&data)?;
        assert!(value.get("accessToken").is_some());
        assert!(value.get("refreshToken").is_some());
        Ok(())
    }
}
