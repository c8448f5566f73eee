use crate::{
    api::{self, handlers::auth::AuthConfig},
    media::MediaConfig,
};
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub cors_origin: String,
    pub access_token_secret: SecretString,
    pub refresh_token_secret: SecretString,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub cookie_secure: bool,
    pub media_cloud_name: String,
    pub media_api_key: String,
    pub media_api_secret: SecretString,
    pub media_base_url: String,
    pub media_timeout_seconds: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new(args.access_token_secret, args.refresh_token_secret)
        .with_access_token_ttl_seconds(args.access_token_ttl_seconds)
        .with_refresh_token_ttl_seconds(args.refresh_token_ttl_seconds)
        .with_cookie_secure(args.cookie_secure);

    let media_config = MediaConfig::new(
        args.media_cloud_name,
        args.media_api_key,
        args.media_api_secret,
    )
    .with_base_url(args.media_base_url)
    .with_timeout_seconds(args.media_timeout_seconds);

    api::new(args.port, args.dsn, args.cors_origin, auth_config, media_config).await
}
