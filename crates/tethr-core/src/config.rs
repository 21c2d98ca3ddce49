//! Configuration consumed by the session transport and heartbeat publisher.
//!
//! Both types are plain values; live changes are applied by handing a new
//! value to `SessionTransport::reload` or by sending it through the
//! `tokio::sync::watch` channels the transport and publisher listen on.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::api::{Result, TethrError};
use crate::auth::SecretString;
use crate::models::HealthStatus;

/// Heartbeat interval used when none is configured.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: i64 = 60;

/// Longest heartbeat interval; larger values are clamped to it.
pub const MAX_HEARTBEAT_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Poll period while heartbeats are disabled, so that re-enabling them
/// through a reload is noticed without restarting the task.
pub const DISABLED_POLL_INTERVAL_SECS: u64 = 10;

/// Connection settings for the remote service.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub base_uri: String,
    pub api_user: String,
    pub password: SecretString,
}

impl SessionConfig {
    pub fn new(
        base_uri: impl Into<String>,
        api_user: impl Into<String>,
        password: impl Into<SecretString>,
    ) -> Self {
        Self {
            base_uri: base_uri.into(),
            api_user: api_user.into(),
            password: password.into(),
        }
    }

    /// Names of required options that are empty.
    pub fn missing_options(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.base_uri.trim().is_empty() {
            missing.push("Uri");
        }
        if self.api_user.is_empty() {
            missing.push("ApiUser");
        }
        if self.password.is_empty() {
            missing.push("Password");
        }
        missing
    }

    /// Parse the base URI, which must be absolute.
    ///
    /// A trailing slash is added so that resource paths resolve beneath the
    /// configured prefix rather than replacing its last segment.
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.base_uri.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw)
            .map_err(|e| TethrError::Config(format!("Uri {:?} is not absolute: {e}", self.base_uri)))?;
        if url.cannot_be_a_base() {
            return Err(TethrError::Config(format!(
                "Uri {:?} cannot be used as a base",
                self.base_uri
            )));
        }
        Ok(url)
    }

    /// Check that every field is present and the URI parses.
    pub fn validate(&self) -> Result<Url> {
        let missing = self.missing_options();
        if !missing.is_empty() {
            return Err(TethrError::Config(format!(
                "missing required options: {}",
                missing.join(", ")
            )));
        }
        self.base_url()
    }
}

/// Callback the broker supplies to report its own health.
pub type StatusCallback = Arc<dyn Fn() -> HealthStatus + Send + Sync>;

/// Heartbeat settings.
#[derive(Clone)]
pub struct HeartbeatConfig {
    /// Seconds between heartbeats. Absent or below 1 disables sending.
    pub interval_seconds: Option<i64>,
    /// Health source; heartbeats report `Healthy` when absent.
    pub status_callback: Option<StatusCallback>,
    /// Identifies this broker instance; defaults to the host name.
    pub name: Option<String>,
    /// Reported software version; defaults to this crate's version.
    pub software_version: Option<String>,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_seconds: Some(DEFAULT_HEARTBEAT_INTERVAL_SECS),
            status_callback: None,
            name: None,
            software_version: None,
        }
    }
}

impl HeartbeatConfig {
    pub fn with_interval(interval_seconds: Option<i64>) -> Self {
        Self {
            interval_seconds,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval_seconds.is_some_and(|s| s >= 1)
    }

    /// Timer period to run at, and whether ticks should send.
    pub fn schedule(&self) -> (Duration, bool) {
        match self.interval_seconds {
            Some(secs) if secs >= 1 => (
                Duration::from_secs(secs.unsigned_abs().min(MAX_HEARTBEAT_INTERVAL_SECS)),
                true,
            ),
            _ => (Duration::from_secs(DISABLED_POLL_INTERVAL_SECS), false),
        }
    }
}

impl fmt::Debug for HeartbeatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeartbeatConfig")
            .field("interval_seconds", &self.interval_seconds)
            .field("status_callback", &self.status_callback.is_some())
            .field("name", &self.name)
            .field("software_version", &self.software_version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_options() {
        let config = SessionConfig::new("", "user", "");
        assert_eq!(config.missing_options(), vec!["Uri", "Password"]);
        assert!(matches!(config.validate(), Err(TethrError::Config(_))));
    }

    #[test]
    fn test_base_url_requires_absolute_uri() {
        let config = SessionConfig::new("tethr.example.com/api", "user", "pw");
        assert!(config.base_url().is_err());

        let config = SessionConfig::new("https://tethr.example.com/api", "user", "pw");
        let url = config.validate().unwrap();
        assert_eq!(url.as_str(), "https://tethr.example.com/api/");
    }

    #[test]
    fn test_heartbeat_schedule() {
        let (period, enabled) = HeartbeatConfig::default().schedule();
        assert_eq!(period, Duration::from_secs(60));
        assert!(enabled);

        let (period, enabled) = HeartbeatConfig::with_interval(Some(1)).schedule();
        assert_eq!(period, Duration::from_secs(1));
        assert!(enabled);

        let (period, enabled) = HeartbeatConfig::with_interval(Some(i64::MAX)).schedule();
        assert_eq!(period, Duration::from_secs(MAX_HEARTBEAT_INTERVAL_SECS));
        assert!(enabled);

        for disabled in [None, Some(0), Some(-5), Some(i64::MIN)] {
            let config = HeartbeatConfig::with_interval(disabled);
            assert!(!config.is_enabled());
            assert_eq!(
                config.schedule(),
                (Duration::from_secs(DISABLED_POLL_INTERVAL_SECS), false)
            );
        }
    }
}
