//! Account and session endpoints.
//!
//! The session model is deliberately small: one refresh token per account,
//! stored in the account row itself. Login and refresh overwrite it, logout
//! clears it, and the access-token gate in [`principal`] never reads it.

pub mod hasher;
pub mod login;
pub mod password;
pub mod principal;
pub mod refresh;
pub mod register;
pub mod session;
pub mod state;
pub mod storage;
pub mod tokens;
pub mod types;

pub use state::{AuthConfig, AuthState};
