use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use serde_json::Value;

use crate::api::{Result, TethrError};

/// Seconds shaved off the advertised lifetime to cover clock skew and
/// requests already in flight when the token expires.
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 45;

/// Longest lifetime accepted from the token endpoint. The service sends a
/// 32-bit count of seconds.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = i32::MAX as i64;

/// The only token type the service issues that this client can use.
const BEARER_TOKEN_TYPE: &str = "bearer";

/// An OAuth access token. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in_seconds: i64,
    pub issued_at: DateTime<Utc>,
}

impl AccessToken {
    /// Instant after which the token is no longer handed out. A lifetime
    /// that cannot be represented makes the token already expired.
    pub fn usable_until(&self) -> DateTime<Utc> {
        TimeDelta::try_seconds(self.expires_in_seconds.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS))
            .and_then(|lifetime| self.issued_at.checked_add_signed(lifetime))
            .unwrap_or(self.issued_at)
    }

    /// Valid while `now` is strictly before [`usable_until`](Self::usable_until).
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && self.usable_until() > now
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

/// Parse the token endpoint response.
///
/// The body is read field by field rather than through a derived struct so
/// that `expires_in` is accepted as either a number or a numeric string.
pub fn parse_token_response(body: &str, issued_at: DateTime<Utc>) -> Result<AccessToken> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| TethrError::Authentication(format!("Failed to parse token response: {e}")))?;
    if !json.is_object() {
        return Err(TethrError::Authentication(
            "Failed to parse token response".to_string(),
        ));
    }

    let token_type = json
        .get("token_type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    // Case-sensitive: the service always sends lowercase "bearer".
    if token_type != BEARER_TOKEN_TYPE {
        return Err(TethrError::UnsupportedTokenType(token_type));
    }

    let access_token = json
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| TethrError::Authentication("Token response has no access_token".to_string()))?
        .to_string();

    let expires_in_seconds = match json.get("expires_in") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(-1),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(-1),
        _ => 0,
    };
    if !(0..=MAX_TOKEN_LIFETIME_SECS).contains(&expires_in_seconds) {
        return Err(TethrError::Authentication(format!(
            "Token response has an out of range expires_in: {}",
            json["expires_in"]
        )));
    }

    Ok(AccessToken {
        access_token,
        token_type,
        expires_in_seconds,
        issued_at,
    })
}

/// Holds the current token. Readers get a shared snapshot.
#[derive(Debug, Default)]
pub struct TokenCache {
    current: RwLock<Option<Arc<AccessToken>>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token if it is still valid at `now`.
    pub fn valid_at(&self, now: DateTime<Utc>) -> Option<Arc<AccessToken>> {
        self.current
            .read()
            .as_ref()
            .filter(|t| t.is_valid_at(now))
            .cloned()
    }

    pub fn valid(&self) -> Option<Arc<AccessToken>> {
        self.valid_at(Utc::now())
    }

    pub fn store(&self, token: AccessToken) -> Arc<AccessToken> {
        let token = Arc::new(token);
        *self.current.write() = Some(token.clone());
        token
    }

    pub fn clear(&self) {
        *self.current.write() = None;
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_none()
    }
}
