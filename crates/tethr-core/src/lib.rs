//! Client SDK for the Tethr ingestion and analytics service.
//!
//! [`SessionTransport`] is the core: it holds credentials and the bearer
//! token, performs authenticated JSON, multipart and streaming calls, and
//! can be reconfigured while requests are in flight. The typed façades in
//! [`services`] sit on top of it, and [`HeartbeatPublisher`] reports the
//! health of the process on a timer.
//!
//! ```no_run
//! # async fn run() -> tethr_core::Result<()> {
//! use std::sync::Arc;
//! use tethr_core::{Capture, SessionConfig, SessionTransport, TransportOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = SessionConfig::new("https://example.audio.tethr.io/", "api-user", "secret");
//! let transport = Arc::new(SessionTransport::new(config, TransportOptions::default())?);
//! let status = Capture::new(transport)
//!     .get_session_status("session-1", &CancellationToken::new())
//!     .await?;
//! println!("{}", status.status);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod heartbeat;
pub mod models;
pub mod services;

pub use api::{
    AudioStream, HttpClient, HttpClientFactory, Result, SessionTransport, TethrError,
    TransportOptions, DEFAULT_DATA_MEDIA_TYPE, SDK_VERSION,
};
pub use auth::{CredentialStore, Credentials, SecretString};
pub use config::{HeartbeatConfig, SessionConfig, StatusCallback};
pub use heartbeat::{HeartbeatPublisher, MonitorSink, PublisherState};
pub use models::{HealthStatus, Metadata, MonitorEvent};
pub use services::{
    ArchivedRecording, AsyncMetadata, CallSessionStatus, CallShare, Capture, Chat, Heartbeat,
    Interaction, Processing, RecordingSettings,
};
