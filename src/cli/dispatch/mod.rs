//! Command-line argument dispatch and server initialization.
//!
//! This module maps validated CLI arguments to the appropriate action, such
//! as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{auth, media};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;
    let cors_origin = matches
        .get_one::<String>("cors-origin")
        .cloned()
        .context("missing required argument: --cors-origin")?;

    let access_token_secret = matches
        .get_one::<String>(auth::ARG_ACCESS_TOKEN_SECRET)
        .cloned()
        .context("missing required argument: --access-token-secret")?;
    let refresh_token_secret = matches
        .get_one::<String>(auth::ARG_REFRESH_TOKEN_SECRET)
        .cloned()
        .context("missing required argument: --refresh-token-secret")?;

    let media_cloud_name = matches
        .get_one::<String>(media::ARG_MEDIA_CLOUD_NAME)
        .cloned()
        .context("missing required argument: --media-cloud-name")?;
    let media_api_key = matches
        .get_one::<String>(media::ARG_MEDIA_API_KEY)
        .cloned()
        .context("missing required argument: --media-api-key")?;
    let media_api_secret = matches
        .get_one::<String>(media::ARG_MEDIA_API_SECRET)
        .cloned()
        .context("missing required argument: --media-api-secret")?;

    Ok(Action::Server(Args {
        port,
        dsn,
        cors_origin,
        access_token_secret: SecretString::from(access_token_secret),
        refresh_token_secret: SecretString::from(refresh_token_secret),
        access_token_ttl_seconds: matches
            .get_one::<i64>(auth::ARG_ACCESS_TOKEN_TTL_SECONDS)
            .copied()
            .unwrap_or(900),
        refresh_token_ttl_seconds: matches
            .get_one::<i64>(auth::ARG_REFRESH_TOKEN_TTL_SECONDS)
            .copied()
            .unwrap_or(864_000),
        cookie_secure: matches
            .get_one::<bool>(auth::ARG_COOKIE_SECURE)
            .copied()
            .unwrap_or(true),
        media_cloud_name,
        media_api_key,
        media_api_secret: SecretString::from(media_api_secret),
        media_base_url: matches
            .get_one::<String>(media::ARG_MEDIA_BASE_URL)
            .cloned()
            .unwrap_or_else(|| "https://api.cloudinary.com".to_string()),
        media_timeout_seconds: matches
            .get_one::<u64>(media::ARG_MEDIA_TIMEOUT_SECONDS)
            .copied()
            .unwrap_or(10),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;
    use secrecy::ExposeSecret;

    #[test]
    fn dispatch_builds_server_args() {
        temp_env::with_vars(
            [
                ("KONTO_DSN", Some("postgres://user@localhost:5432/konto")),
                ("KONTO_ACCESS_TOKEN_SECRET", Some("access-secret")),
                ("KONTO_REFRESH_TOKEN_SECRET", Some("refresh-secret")),
                ("KONTO_MEDIA_CLOUD_NAME", Some("demo")),
                ("KONTO_MEDIA_API_KEY", Some("key")),
                ("KONTO_MEDIA_API_SECRET", Some("media-secret")),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["konto"]);
                let action = handler(&matches).expect("dispatch should succeed");
                let Action::Server(args) = action;
                assert_eq!(args.port, 8080);
                assert_eq!(args.dsn, "postgres://user@localhost:5432/konto");
                assert_eq!(args.access_token_secret.expose_secret(), "access-secret");
                assert_eq!(args.refresh_token_secret.expose_secret(), "refresh-secret");
                assert_eq!(args.access_token_ttl_seconds, 900);
                assert_eq!(args.refresh_token_ttl_seconds, 864_000);
                assert!(args.cookie_secure);
                assert_eq!(args.media_cloud_name, "demo");
                assert_eq!(args.media_base_url, "https://api.cloudinary.com");
                assert_eq!(args.media_timeout_seconds, 10);
            },
        );
    }
}
