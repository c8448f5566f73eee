//! Auth configuration and shared state.

use secrecy::SecretString;

use super::tokens::TokenCodec;

const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 10 * 24 * 60 * 60;

#[derive(Clone)]
pub struct AuthConfig {
    access_token_secret: SecretString,
    refresh_token_secret: SecretString,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
    cookie_secure: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn new(access_token_secret: SecretString, refresh_token_secret: SecretString) -> Self {
        Self {
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            cookie_secure: true,
        }
    }

    #[must_use]
    pub fn with_access_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    pub(super) fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_seconds
    }

    pub(super) fn refresh_token_ttl_seconds(&self) -> i64 {
        self.refresh_token_ttl_seconds
    }

    pub(super) fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token_secret", &"***")
            .field("refresh_token_secret", &"***")
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

pub struct AuthState {
    config: AuthConfig,
    codec: TokenCodec,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let codec = TokenCodec::new(
            &config.access_token_secret,
            &config.refresh_token_secret,
            config.access_token_ttl_seconds,
            config.refresh_token_ttl_seconds,
        );
        Self { config, codec }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(crate) fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::tokens::TokenKind;
    use uuid::Uuid;

    fn test_config() -> AuthConfig {
        AuthConfig::new(
            SecretString::from("access-secret".to_string()),
            SecretString::from("refresh-secret".to_string()),
        )
    }

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = test_config();
        assert_eq!(
            config.access_token_ttl_seconds(),
            DEFAULT_ACCESS_TOKEN_TTL_SECONDS
        );
        assert_eq!(
            config.refresh_token_ttl_seconds(),
            DEFAULT_REFRESH_TOKEN_TTL_SECONDS
        );
        assert!(config.cookie_secure());

        let config = config
            .with_access_token_ttl_seconds(60)
            .with_refresh_token_ttl_seconds(120)
            .with_cookie_secure(false);
        assert_eq!(config.access_token_ttl_seconds(), 60);
        assert_eq!(config.refresh_token_ttl_seconds(), 120);
        assert!(!config.cookie_secure());
    }

    #[test]
    fn debug_redacts_secrets() {
        let printed = format!("{:?}", test_config());
        assert!(printed.contains("***"));
        assert!(!printed.contains("access-secret"));
        assert!(!printed.contains("refresh-secret"));
    }

    #[test]
    fn state_codec_uses_configured_ttls() {
        let state = AuthState::new(test_config().with_access_token_ttl_seconds(60));
        assert_eq!(state.codec().access_ttl_seconds(), 60);

        let account_id = Uuid::new_v4();
        let token = state
            .codec()
            .issue(TokenKind::Access, account_id)
            .expect("signing should succeed");
        assert_eq!(
            state.codec().verify(TokenKind::Access, &token),
            Ok(account_id)
        );
    }
}
