//! Broker configuration.
//!
//! Settings are read from `~/.config/tethr-broker/config.json` and then
//! overridden by `TETHR_*` environment variables (a `.env` file is loaded
//! first by `main`). The password never lives in the file: it comes from
//! `TETHR_PASSWORD` or the OS keychain.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tethr_core::{CredentialStore, HeartbeatConfig, SecretString, SessionConfig, TransportOptions};

/// Application name used for the config directory
const APP_NAME: &str = "tethr-broker";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BrokerConfig {
    pub uri: Option<String>,
    pub api_user: Option<String>,
    pub heartbeat_interval_seconds: Option<i64>,
    pub proxy: Option<String>,
    pub machine_name: Option<String>,
    #[serde(skip)]
    pub password: Option<SecretString>,
}

impl BrokerConfig {
    /// Load the file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents).with_context(|| format!("Invalid config in {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Override fields from variables returned by `lookup`. Empty values
    /// are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(uri) = var("TETHR_URI") {
            self.uri = Some(uri);
        }
        if let Some(api_user) = var("TETHR_API_USER") {
            self.api_user = Some(api_user);
        }
        if let Some(password) = var("TETHR_PASSWORD") {
            self.password = Some(SecretString::new(password));
        }
        if let Some(proxy) = var("TETHR_PROXY") {
            self.proxy = Some(proxy);
        }
        if let Some(interval) = var("TETHR_HEARTBEAT_INTERVAL_SECONDS") {
            let seconds = interval
                .trim()
                .parse()
                .with_context(|| format!("TETHR_HEARTBEAT_INTERVAL_SECONDS is not a number: {interval:?}"))?;
            self.heartbeat_interval_seconds = Some(seconds);
        }
        Ok(())
    }

    /// Connection settings, reading the password from the keychain when it
    /// was not supplied through the environment.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let api_user = self.api_user.clone().unwrap_or_default();
        let password = match &self.password {
            Some(password) => password.clone(),
            None if !api_user.is_empty() && CredentialStore::has_credentials(&api_user) => {
                CredentialStore::get_password(&api_user)
                    .with_context(|| format!("Failed to read the password for {api_user} from the keychain"))?
            }
            None => SecretString::default(),
        };

        let config = SessionConfig::new(self.uri.clone().unwrap_or_default(), api_user, password);
        let missing = config.missing_options();
        if !missing.is_empty() {
            anyhow::bail!(
                "Missing configuration: {} (set them in {} or TETHR_* environment variables)",
                missing.join(", "),
                Self::config_path().map(|p| p.display().to_string()).unwrap_or_else(|_| CONFIG_FILE.to_string())
            );
        }
        Ok(config)
    }

    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        let mut config = HeartbeatConfig::default();
        if self.heartbeat_interval_seconds.is_some() {
            config.interval_seconds = self.heartbeat_interval_seconds;
        }
        config.name = self.machine_name.clone();
        config
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            proxy: self.proxy.clone(),
            ..TransportOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_file_format() {
        let config: BrokerConfig = serde_json::from_str(
            r#"{
                "uri": "https://acme.audio.tethr.io/",
                "apiUser": "broker",
                "heartbeatIntervalSeconds": 30,
                "machineName": "capture-01"
            }"#,
        )
        .unwrap();
        assert_eq!(config.api_user.as_deref(), Some("broker"));
        assert_eq!(config.heartbeat_interval_seconds, Some(30));
        assert!(config.password.is_none());

        let heartbeat = config.heartbeat_config();
        assert_eq!(heartbeat.interval_seconds, Some(30));
        assert_eq!(heartbeat.name.as_deref(), Some("capture-01"));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = BrokerConfig {
            uri: Some("https://old.example.com/".to_string()),
            api_user: Some("broker".to_string()),
            ..BrokerConfig::default()
        };
        config
            .apply_env(env(&[
                ("TETHR_URI", "https://new.example.com/"),
                ("TETHR_API_USER", ""),
                ("TETHR_PASSWORD", "from-env"),
                ("TETHR_HEARTBEAT_INTERVAL_SECONDS", "0"),
            ]))
            .unwrap();

        assert_eq!(config.uri.as_deref(), Some("https://new.example.com/"));
        assert_eq!(config.api_user.as_deref(), Some("broker"));
        assert!(!config.heartbeat_config().is_enabled());

        let session = config.session_config().unwrap();
        assert_eq!(session.password.expose(), "from-env");
    }

    #[test]
    fn test_bad_interval() {
        let mut config = BrokerConfig::default();
        let err = config
            .apply_env(env(&[("TETHR_HEARTBEAT_INTERVAL_SECONDS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("TETHR_HEARTBEAT_INTERVAL_SECONDS"));
    }

    #[test]
    fn test_missing_settings_are_named() {
        let config = BrokerConfig {
            password: Some(SecretString::new("pw")),
            ..BrokerConfig::default()
        };
        let err = config.session_config().unwrap_err().to_string();
        assert!(err.contains("Uri"));
        assert!(err.contains("ApiUser"));
        assert!(!err.contains("Password"));
    }

    #[test]
    fn test_default_heartbeat_interval() {
        let heartbeat = BrokerConfig::default().heartbeat_config();
        assert_eq!(heartbeat.interval_seconds, Some(tethr_core::config::DEFAULT_HEARTBEAT_INTERVAL_SECS));
    }
}
