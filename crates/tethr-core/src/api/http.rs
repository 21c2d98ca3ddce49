use std::time::Duration;

use reqwest::{redirect, Client, Proxy};
use tracing::{info, warn};
use url::Url;

use super::{Result, TethrError};

/// HTTP request timeout. Uploads of long recordings can take minutes.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// SDK version reported in the user agent and startup log.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Settings fixed at transport construction.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Proxy for all requests. `None` uses a direct connection.
    pub proxy: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
    /// Drop the cached token when a resource call returns 401.
    pub reset_token_on_unauthorized: bool,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            user_agent: format!(
                "TethrBroker/{} ({}) rust",
                SDK_VERSION,
                std::env::consts::OS
            ),
            reset_token_on_unauthorized: true,
        }
    }
}

/// A reqwest client bound to one base URI. Never mutated once built, so a
/// snapshot can be used without holding any lock.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
}

impl HttpClient {
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a resource path beneath the base URI.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        if path.trim().is_empty() {
            return Err(TethrError::InvalidArgument(
                "resource path must not be empty".to_string(),
            ));
        }
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TethrError::InvalidArgument(format!("invalid resource path {path:?}: {e}")))
    }
}

/// Builds [`HttpClient`]s from [`TransportOptions`].
#[derive(Debug, Clone, Default)]
pub struct HttpClientFactory {
    options: TransportOptions,
}

impl HttpClientFactory {
    pub fn new(options: TransportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    pub fn create(&self, base_url: Url) -> Result<HttpClient> {
        if !base_url.scheme().eq_ignore_ascii_case("https") {
            warn!(host = %base_url, "Not using HTTPS for connection to server");
        }

        let mut builder = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(self.options.timeout)
            .user_agent(self.options.user_agent.as_str());

        let mut proxy_display = "None".to_string();
        match self.options.proxy.as_deref().map(Proxy::all) {
            Some(Ok(proxy)) => {
                builder = builder.proxy(proxy);
                proxy_display = self.options.proxy.clone().unwrap_or_default();
            }
            Some(Err(e)) => {
                warn!(error = %e, "Not able to get proxy");
                builder = builder.no_proxy();
            }
            None => {
                builder = builder.no_proxy();
            }
        }

        info!(
            host = %base_url,
            version = SDK_VERSION,
            proxy = %proxy_display,
            "Requests for Tethr initiated"
        );

        let client = builder
            .build()
            .map_err(|e| TethrError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(HttpClient { client, base_url })
    }
}
