//! Authenticated transport to the Tethr API.
//!
//! `SessionTransport` owns the token lifecycle (client credentials grant,
//! caching, expiry, reset on 401) and the reqwest client bound to the
//! configured base URI. It is safe to share one instance behind an `Arc`
//! across any number of tasks.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use super::http::{HttpClient, HttpClientFactory, TransportOptions};
use super::stream::AudioStream;
use super::{Result, TethrError};
use crate::auth::{parse_token_response, AccessToken, Credentials, TokenCache};
use crate::config::SessionConfig;

const TOKEN_PATH: &str = "/Token";
const JSON_MEDIA_TYPE: &str = "application/json";
const AUDIO_MPEG_MEDIA_TYPE: &str = "audio/mpeg";

/// Media type of the multipart data part when the caller has none to give.
pub const DEFAULT_DATA_MEDIA_TYPE: &str = "application/octet-stream";

/// Client and credentials in effect. Swapped as a unit on reload.
struct Connection {
    http: Arc<HttpClient>,
    credentials: Arc<Credentials>,
}

/// Run `fut` unless `cancel` fires first.
pub(crate) async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TethrError::Cancelled),
        out = fut => Ok(out),
    }
}

pub struct SessionTransport {
    factory: HttpClientFactory,
    connection: RwLock<Connection>,
    tokens: TokenCache,
    /// Serializes token fetches and configuration reloads.
    auth_lock: Mutex<()>,
    reset_token_on_unauthorized: AtomicBool,
}

impl SessionTransport {
    /// Create a transport. Fails if any part of `config` is missing.
    pub fn new(config: SessionConfig, options: TransportOptions) -> Result<Self> {
        let base_url = config.validate()?;
        let reset = options.reset_token_on_unauthorized;
        let factory = HttpClientFactory::new(options);
        let http = factory.create(base_url)?;

        Ok(Self {
            factory,
            connection: RwLock::new(Connection {
                http: Arc::new(http),
                credentials: Arc::new(Credentials::new(config.api_user.clone(), config.password.clone())),
            }),
            tokens: TokenCache::new(),
            auth_lock: Mutex::new(()),
            reset_token_on_unauthorized: AtomicBool::new(reset),
        })
    }

    /// When true (the default), a 401 from a resource call drops the cached
    /// token so the next request authenticates again. The failed request is
    /// never retried automatically.
    pub fn set_reset_token_on_unauthorized(&self, enabled: bool) {
        self.reset_token_on_unauthorized.store(enabled, Ordering::Relaxed);
    }

    pub fn reset_token_on_unauthorized(&self) -> bool {
        self.reset_token_on_unauthorized.load(Ordering::Relaxed)
    }

    pub fn base_url(&self) -> Url {
        self.connection.read().http.base_url().clone()
    }

    pub fn api_user(&self) -> String {
        self.connection.read().credentials.api_user().to_string()
    }

    /// Whether a token is cached, valid or not.
    pub fn has_cached_token(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// Discard the cached token; the next request fetches a new one.
    pub fn clear_auth_token(&self) {
        self.tokens.clear();
    }

    fn http(&self) -> Arc<HttpClient> {
        self.connection.read().http.clone()
    }

    // ===== Configuration =====

    /// Apply a new configuration.
    ///
    /// Rejected wholesale if any field is empty or the URI does not parse:
    /// the previous client, credentials and token stay in effect. Otherwise
    /// the client is replaced when the URI changed, the credentials are
    /// replaced, and the cached token is dropped.
    pub async fn reload(&self, config: SessionConfig) -> Result<()> {
        let _guard = self.auth_lock.lock().await;

        let missing = config.missing_options();
        if !missing.is_empty() {
            for option in &missing {
                warn!(option = *option, "Error processing option, option is missing from the options");
            }
            return Err(TethrError::Config(format!(
                "missing required options: {}",
                missing.join(", ")
            )));
        }

        let base_url = config.base_url().inspect_err(|e| {
            warn!(error = %e, "Error processing change to options");
        })?;

        let current = self.http();
        // The old client is left to whichever requests still hold it.
        let http = if *current.base_url() != base_url {
            Arc::new(self.factory.create(base_url).inspect_err(|e| {
                warn!(error = %e, "Error processing change to options");
            })?)
        } else {
            current
        };

        let credentials = Arc::new(Credentials::new(config.api_user.clone(), config.password.clone()));
        {
            let mut connection = self.connection.write();
            connection.http = http;
            connection.credentials = credentials;
        }
        self.tokens.clear();

        info!(host = %self.base_url(), "Session configuration updated");
        Ok(())
    }

    /// Apply every configuration published on `rx` until `cancel` fires.
    pub fn watch_config(
        self: &Arc<Self>,
        mut rx: watch::Receiver<SessionConfig>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let transport = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let config = rx.borrow_and_update().clone();
                        // Rejections are logged inside reload.
                        let _ = transport.reload(config).await;
                    }
                }
            }
            debug!("Session configuration watcher stopped");
        })
    }

    // ===== Token handling =====

    async fn access_token(&self, cancel: &CancellationToken) -> Result<Arc<AccessToken>> {
        if let Some(token) = self.tokens.valid() {
            return Ok(token);
        }

        let _guard = cancellable(cancel, self.auth_lock.lock()).await?;

        // Another caller may have refreshed while we waited for the lock.
        if let Some(token) = self.tokens.valid() {
            return Ok(token);
        }

        let (http, credentials) = {
            let connection = self.connection.read();
            (connection.http.clone(), connection.credentials.clone())
        };

        let token = cancellable(cancel, Self::fetch_token(&http, &credentials)).await??;
        if !token.is_valid() {
            return Err(TethrError::Authentication(
                "Failed to get a valid token from Tethr".to_string(),
            ));
        }

        Ok(self.tokens.store(token))
    }

    async fn fetch_token(http: &HttpClient, credentials: &Credentials) -> Result<AccessToken> {
        let url = http.resolve(TOKEN_PATH)?;
        debug!(url = %url, "Requesting access token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", credentials.api_user()),
            ("client_secret", credentials.api_password().expose()),
        ];

        let response = http
            .client()
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| TethrError::Authentication(format!("Token request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TethrError::Authentication(format!(
                "Server returned {status} to request to get Access Token"
            )));
        }
        if !status.is_success() {
            return Err(TethrError::Authentication(format!(
                "Token request failed with status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TethrError::Authentication(format!("Failed to read token response: {e}")))?;

        let token = parse_token_response(&body, Utc::now()).inspect_err(|e| {
            if let TethrError::UnsupportedTokenType(token_type) = e {
                warn!(token_type = %token_type, "Can only support Bearer tokens");
            }
        })?;

        info!(
            token_type = %token.token_type,
            expires_in = token.expires_in_seconds,
            "Token received"
        );
        Ok(token)
    }

    // ===== Request plumbing =====

    async fn send(
        &self,
        method: Method,
        path: &str,
        cancel: &CancellationToken,
        body: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response> {
        let http = self.http();
        let url = http.resolve(path)?;
        let token = self.access_token(cancel).await?;

        debug!(method = %method, path = path, "Making a request");

        let request = body(
            http.client()
                .request(method, url)
                .bearer_auth(&token.access_token),
        );

        Ok(cancellable(cancel, request.send()).await??)
    }

    async fn ensure_success(
        &self,
        response: Response,
        is_get: bool,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED && self.reset_token_on_unauthorized() {
            self.tokens.clear();
        }

        let body = if status == StatusCode::BAD_REQUEST {
            let text = cancellable(cancel, response.text()).await?.unwrap_or_default();
            error!(
                path = path,
                body = %TethrError::truncate_body(&text),
                "Request returned 400 (Bad Request)"
            );
            Some(text)
        } else {
            debug!(path = path, status = %status, "Request failed");
            None
        };

        Err(TethrError::from_status(status, body, is_get, path))
    }

    fn ensure_content_type(response: &Response, expected: &str) -> Result<()> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let media_type = content_type.split(';').next().unwrap_or_default().trim();

        if media_type.eq_ignore_ascii_case(expected) {
            Ok(())
        } else {
            Err(TethrError::UnexpectedResponse {
                content_type: content_type.to_string(),
            })
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response, cancel: &CancellationToken) -> Result<T> {
        Self::read_optional_json(response, cancel).await?.ok_or_else(|| {
            TethrError::ProcessingFailure("Failed to deserialize response".to_string())
        })
    }

    /// Like `read_json`, but a JSON `null` body is `None`.
    async fn read_optional_json<T: DeserializeOwned>(
        response: Response,
        cancel: &CancellationToken,
    ) -> Result<Option<T>> {
        Self::ensure_content_type(&response, JSON_MEDIA_TYPE)?;
        let bytes = cancellable(cancel, response.bytes()).await??;

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| TethrError::ProcessingFailure(format!("Failed to deserialize response: {e}")))?;
        if value.is_null() {
            return Ok(None);
        }

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| TethrError::ProcessingFailure(format!("Failed to deserialize response: {e}")))
    }

    fn to_json<T: Serialize + ?Sized>(body: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(body)
            .map_err(|e| TethrError::ProcessingFailure(format!("Failed to serialize request: {e}")))
    }

    // ===== Operations =====

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, cancel: &CancellationToken) -> Result<T> {
        let response = self.send(Method::GET, path, cancel, |r| r).await?;
        let response = self.ensure_success(response, true, path, cancel).await?;
        Self::read_json(response, cancel).await
    }

    /// GET a JSON resource the service may answer with `null`.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<T>> {
        let response = self.send(Method::GET, path, cancel, |r| r).await?;
        let response = self.ensure_success(response, true, path, cancel).await?;
        Self::read_optional_json(response, cancel).await
    }

    /// GET an `audio/mpeg` resource as a stream owned by the caller.
    pub async fn get_stream(&self, path: &str, cancel: &CancellationToken) -> Result<AudioStream> {
        let response = self.send(Method::GET, path, cancel, |r| r).await?;
        // On any error below the response is dropped here, releasing the connection.
        let response = self.ensure_success(response, true, path, cancel).await?;
        Self::ensure_content_type(&response, AUDIO_MPEG_MEDIA_TYPE)?;
        Ok(AudioStream::new(response))
    }

    /// POST a JSON body, expecting no response payload.
    pub async fn post<B>(&self, path: &str, body: &B, cancel: &CancellationToken) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let json = Self::to_json(body)?;
        let response = self
            .send(Method::POST, path, cancel, |r| {
                r.header(CONTENT_TYPE, JSON_MEDIA_TYPE).body(json)
            })
            .await?;
        self.ensure_success(response, false, path, cancel).await?;
        Ok(())
    }

    /// POST a JSON body and deserialize the JSON response.
    pub async fn post_returning<B, T>(&self, path: &str, body: &B, cancel: &CancellationToken) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let json = Self::to_json(body)?;
        let response = self
            .send(Method::POST, path, cancel, |r| {
                r.header(CONTENT_TYPE, JSON_MEDIA_TYPE).body(json)
            })
            .await?;
        let response = self.ensure_success(response, false, path, cancel).await?;
        Self::read_json(response, cancel).await
    }

    /// POST with an empty body.
    pub async fn post_empty(&self, path: &str, cancel: &CancellationToken) -> Result<()> {
        let response = self
            .send(Method::POST, path, cancel, |r| r.header(CONTENT_LENGTH, 0))
            .await?;
        self.ensure_success(response, false, path, cancel).await?;
        Ok(())
    }

    /// POST a two part multipart body: `info` as JSON and `data` as raw bytes
    /// tagged with `data_media_type`. Deserializes the JSON response.
    pub async fn post_multipart<I, R, T>(
        &self,
        path: &str,
        info: &I,
        data: &mut R,
        data_media_type: &str,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        I: Serialize + ?Sized,
        R: AsyncRead + Unpin + ?Sized,
        T: DeserializeOwned,
    {
        let info_json = Self::to_json(info)?;

        let mut buffer = Vec::new();
        cancellable(cancel, data.read_to_end(&mut buffer))
            .await?
            .map_err(|e| TethrError::ProcessingFailure(format!("Failed to read data stream: {e}")))?;

        let media_type = if data_media_type.trim().is_empty() {
            DEFAULT_DATA_MEDIA_TYPE
        } else {
            data_media_type
        };

        let info_part = Part::bytes(info_json)
            .mime_str(JSON_MEDIA_TYPE)
            .map_err(|e| TethrError::ProcessingFailure(format!("Failed to build info part: {e}")))?;
        let data_part = Part::bytes(buffer)
            .mime_str(media_type)
            .map_err(|e| TethrError::ProcessingFailure(format!("Invalid data media type {media_type:?}: {e}")))?;

        let form = Form::new().part("info", info_part).part("data", data_part);

        let response = self
            .send(Method::POST, path, cancel, |r| r.multipart(form))
            .await?;
        let response = self.ensure_success(response, false, path, cancel).await?;
        Self::read_json(response, cancel).await
    }
}
