//! Media host adapter for profile images.
//!
//! Talks to a Cloudinary-compatible HTTP API: `image/upload` for new assets,
//! `image/destroy` to drop replaced ones. Requests are signed with SHA-256
//! over the sorted parameter string plus the API secret.

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::{Client, StatusCode, multipart};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;
use tracing::{Instrument, info_span};

const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com";
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Clone)]
pub struct MediaConfig {
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
    base_url: String,
    timeout_seconds: u64,
}

impl MediaConfig {
    #[must_use]
    pub fn new(cloud_name: String, api_key: String, api_secret: SecretString) -> Self {
        Self {
            cloud_name,
            api_key,
            api_secret,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    #[must_use]
    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media host request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("media host rejected the request with status {status}")]
    Rejected { status: StatusCode },
    #[error("media host did not delete the asset")]
    DeleteFailed,
}

/// Asset pointers returned by the media host after a successful upload.
#[derive(Debug, Deserialize)]
pub struct UploadedImage {
    #[serde(rename = "secure_url")]
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

pub struct MediaClient {
    client: Client,
    config: MediaConfig,
}

impl MediaClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: MediaConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("failed to build media HTTP client")?;
        Ok(Self { client, config })
    }

    /// Upload an image and return its URL and host-side public id.
    ///
    /// # Errors
    /// Returns `MediaError` when the host is unreachable or rejects the upload.
    pub async fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage, MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("timestamp", timestamp.as_str())],
            self.config.api_secret.expose_secret(),
        );

        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let url = self.endpoint("upload");
        let span = info_span!("media.upload", http.method = "POST", url = %url);
        async {
            let response = self.client.post(&url).multipart(form).send().await?;
            if !response.status().is_success() {
                return Err(MediaError::Rejected {
                    status: response.status(),
                });
            }
            Ok(response.json::<UploadedImage>().await?)
        }
        .instrument(span)
        .await
    }

    /// Delete an asset by its public id.
    ///
    /// # Errors
    /// Returns `MediaError` when the host is unreachable, rejects the request,
    /// or reports anything other than a successful deletion.
    pub async fn delete_image(&self, public_id: &str) -> Result<(), MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        // Signed params must stay sorted by key.
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", timestamp.as_str())],
            self.config.api_secret.expose_secret(),
        );

        let url = self.endpoint("destroy");
        let span = info_span!("media.destroy", http.method = "POST", url = %url);
        async {
            let response = self
                .client
                .post(&url)
                .form(&[
                    ("public_id", public_id),
                    ("api_key", self.config.api_key.as_str()),
                    ("timestamp", timestamp.as_str()),
                    ("signature", signature.as_str()),
                    ("signature_algorithm", "sha256"),
                ])
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(MediaError::Rejected {
                    status: response.status(),
                });
            }
            let destroyed = response.json::<DestroyResponse>().await?;
            if destroyed.result == "ok" {
                Ok(())
            } else {
                Err(MediaError::DeleteFailed)
            }
        }
        .instrument(span)
        .await
    }

    fn endpoint(&self, operation: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{operation}",
            self.config.base_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }
}

/// Signature over `key=value&...` (sorted by key) followed by the API secret.
fn sign_params(sorted_params: &[(&str, &str)], api_secret: &str) -> String {
    let joined = sorted_params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> MediaConfig {
        MediaConfig::new(
            "demo".to_string(),
            "key".to_string(),
            SecretString::from("shh".to_string()),
        )
    }

    #[test]
    fn config_defaults_and_overrides() {
        let config = test_config();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);

        let config = config
            .with_base_url("http://localhost:9999".to_string())
            .with_timeout_seconds(3);
        assert_eq!(config.base_url(), "http://localhost:9999");
        assert_eq!(config.timeout_seconds, 3);
    }

    #[test]
    fn debug_redacts_api_secret() {
        let printed = format!("{:?}", test_config());
        assert!(printed.contains("***"));
        assert!(!printed.contains("shh"));
    }

    #[test]
    fn endpoint_includes_cloud_and_operation() {
        let client = MediaClient::new(test_config()).expect("client should build");
        assert_eq!(
            client.endpoint("upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
        assert_eq!(
            client.endpoint("destroy"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let config = test_config().with_base_url("http://localhost:9999/".to_string());
        let client = MediaClient::new(config).expect("client should build");
        assert_eq!(
            client.endpoint("upload"),
            "http://localhost:9999/v1_1/demo/image/upload"
        );
    }

    #[test]
    fn sign_params_is_deterministic() {
        let first = sign_params(&[("timestamp", "1700000000")], "secret");
        let second = sign_params(&[("timestamp", "1700000000")], "secret");
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn sign_params_depends_on_secret_and_params() {
        let base = sign_params(&[("timestamp", "1700000000")], "secret");
        let other_secret = sign_params(&[("timestamp", "1700000000")], "other");
        let other_params = sign_params(
            &[("public_id", "avatar/1"), ("timestamp", "1700000000")],
            "secret",
        );
        assert_ne!(base, other_secret);
        assert_ne!(base, other_params);
    }

    #[test]
    fn uploaded_image_parses_host_response() {
        let body = r#"{
            "public_id": "avatars/abc123",
            "secure_url": "https://res.example.com/image/upload/avatars/abc123.png",
            "bytes": 1024
        }"#;
        let image: UploadedImage = serde_json::from_str(body).expect("valid upload response");
        assert_eq!(image.public_id, "avatars/abc123");
        assert!(image.url.ends_with("abc123.png"));
    }

    #[test]
    fn destroy_response_parses_result() {
        let ok: DestroyResponse = serde_json::from_str(r#"{"result":"ok"}"#).expect("valid");
        assert_eq!(ok.result, "ok");
        let missing: DestroyResponse =
            serde_json::from_str(r#"{"result":"not found"}"#).expect("valid");
        assert_eq!(missing.result, "not found");
    }
}
