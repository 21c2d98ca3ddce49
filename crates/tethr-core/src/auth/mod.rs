//! Authentication building blocks for the session transport.
//!
//! This module provides:
//! - `SecretString` / `Credentials`: in-memory secrets that zero on drop
//! - `CredentialStore`: OS keychain storage for the API password
//! - `AccessToken` / `TokenCache`: the bearer token and its expiry rules
//!
//! Tokens are considered expired 45 seconds before the lifetime the
//! server advertises.

pub mod credentials;
pub mod token;

pub use credentials::{CredentialStore, Credentials, SecretString};
pub use token::{parse_token_response, AccessToken, TokenCache, TOKEN_EXPIRY_MARGIN_SECS};
