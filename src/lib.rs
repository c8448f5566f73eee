//! # Konto (accounts & sessions)
//!
//! `konto` is a single-process user-account backend. It handles registration
//! with avatar/cover-image upload to a Cloudinary-compatible media host,
//! credential login, access/refresh token issuance, logout, password changes,
//! and profile updates.
//!
//! ## Session Model
//!
//! Sessions are tracked with a signed access/refresh token pair:
//!
//! - **Access tokens** are short-lived and presented on every authenticated
//!   request, via cookie or `Authorization: Bearer`.
//! - **Refresh tokens** are long-lived and only exchanged at `/refresh-token`.
//!   The database stores exactly one refresh token per account; every login or
//!   refresh overwrites it, which implicitly revokes the previous one. An
//!   account therefore has at most one active session.
//!
//! Refresh rotation is a single conditional `UPDATE` keyed on the presented
//! token, so concurrent logins/refreshes for the same account cannot lose an
//! overwrite, and a superseded token is rejected on reuse.
//!
//! ## Profile Media
//!
//! Avatar and cover images live on the media host; the database keeps their
//! URL and host-side public id. Replacing an image uploads the new asset
//! first, deletes the previous one, then persists the new pointer. A failed
//! account insert after a successful upload is not compensated.

pub mod api;
pub mod cli;
pub mod media;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
