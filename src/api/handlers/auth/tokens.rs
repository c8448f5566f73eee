//! Signed, time-limited session tokens.
//!
//! Two classes of token share one claim shape: short-lived access tokens
//! presented on every authenticated request, and long-lived refresh tokens
//! exchanged only at `/refresh-token`. Each class is signed with its own
//! secret and carries a `kind` claim, so a token of one class can never be
//! verified as the other.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Account id, the only payload claim beyond bookkeeping.
    pub sub: Uuid,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired.")]
    Expired,
    #[error("Invalid token.")]
    Invalid,
}

struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

pub struct TokenCodec {
    access: TokenKeys,
    refresh: TokenKeys,
}

/// A freshly issued access/refresh pair for one account.
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenCodec {
    pub(crate) fn new(
        access_secret: &SecretString,
        refresh_secret: &SecretString,
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
    ) -> Self {
        Self {
            access: TokenKeys {
                encoding: EncodingKey::from_secret(access_secret.expose_secret().as_bytes()),
                decoding: DecodingKey::from_secret(access_secret.expose_secret().as_bytes()),
                ttl_seconds: access_ttl_seconds,
            },
            refresh: TokenKeys {
                encoding: EncodingKey::from_secret(refresh_secret.expose_secret().as_bytes()),
                decoding: DecodingKey::from_secret(refresh_secret.expose_secret().as_bytes()),
                ttl_seconds: refresh_ttl_seconds,
            },
        }
    }

    fn keys(&self, kind: TokenKind) -> &TokenKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Issue a signed token of the given kind for an account.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub(crate) fn issue(&self, kind: TokenKind, account_id: Uuid) -> Result<String> {
        let keys = self.keys(kind);
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: account_id,
            kind,
            iat: now,
            exp: now + keys.ttl_seconds,
        };
        encode(&Header::default(), &claims, &keys.encoding).context("failed to sign token")
    }

    /// Issue a fresh access/refresh pair for an account.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub(crate) fn issue_pair(&self, account_id: Uuid) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.issue(TokenKind::Access, account_id)?,
            refresh: self.issue(TokenKind::Refresh, account_id)?,
        })
    }

    /// Verify a token of the expected kind and return the account id.
    ///
    /// # Errors
    /// Returns `TokenError` when the signature is invalid, the token has
    /// expired, the payload is malformed, or the kind claim does not match.
    pub(crate) fn verify(&self, kind: TokenKind, token: &str) -> Result<Uuid, TokenError> {
        let keys = self.keys(kind);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<TokenClaims>(token, &keys.decoding, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        if data.claims.kind != kind {
            return Err(TokenError::Invalid);
        }

        Ok(data.claims.sub)
    }

    pub(crate) const fn access_ttl_seconds(&self) -> i64 {
        self.access.ttl_seconds
    }

    pub(crate) const fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh.ttl_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_codec() -> TokenCodec {
        TokenCodec::new(
            &SecretString::from("access-secret".to_string()),
            &SecretString::from("refresh-secret".to_string()),
            900,
            864_000,
        )
    }

    #[test]
    fn issue_and_verify_round_trip() -> Result<()> {
        let codec = test_codec();
        let account_id = Uuid::new_v4();

        let pair = codec.issue_pair(account_id)?;
        assert_eq!(codec.verify(TokenKind::Access, &pair.access), Ok(account_id));
        assert_eq!(
            codec.verify(TokenKind::Refresh, &pair.refresh),
            Ok(account_id)
        );
        Ok(())
    }

    #[test]
    fn access_token_rejected_as_refresh() -> Result<()> {
        let codec = test_codec();
        let token = codec.issue(TokenKind::Access, Uuid::new_v4())?;
        // Wrong class: different secret, so the signature check already fails.
        assert_eq!(
            codec.verify(TokenKind::Refresh, &token),
            Err(TokenError::Invalid)
        );
        Ok(())
    }

    #[test]
    fn kind_claim_checked_even_with_shared_secret() -> Result<()> {
        let secret = SecretString::from("shared".to_string());
        let codec = TokenCodec::new(&secret, &secret, 900, 864_000);
        let token = codec.issue(TokenKind::Access, Uuid::new_v4())?;
        assert_eq!(
            codec.verify(TokenKind::Refresh, &token),
            Err(TokenError::Invalid)
        );
        Ok(())
    }

    #[test]
    fn expired_token_rejected() {
        let codec = TokenCodec::new(
            &SecretString::from("access-secret".to_string()),
            &SecretString::from("refresh-secret".to_string()),
            -120,
            -120,
        );
        let token = codec
            .issue(TokenKind::Access, Uuid::new_v4())
            .expect("signing should succeed");
        assert_eq!(
            codec.verify(TokenKind::Access, &token),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn garbage_token_rejected() {
        let codec = test_codec();
        assert_eq!(
            codec.verify(TokenKind::Access, "not-a-token"),
            Err(TokenError::Invalid)
        );
        assert_eq!(codec.verify(TokenKind::Access, ""), Err(TokenError::Invalid));
    }

    #[test]
    fn tampered_token_rejected() -> Result<()> {
        let codec = test_codec();
        let token = codec.issue(TokenKind::Access, Uuid::new_v4())?;
        let mut tampered = token.clone();
        tampered.pop();
        assert_eq!(
            codec.verify(TokenKind::Access, &tampered),
            Err(TokenError::Invalid)
        );
        Ok(())
    }

    #[test]
    fn ttls_are_exposed() {
        let codec = test_codec();
        assert_eq!(codec.access_ttl_seconds(), 900);
        assert_eq!(codec.refresh_ttl_seconds(), 864_000);
    }
}
