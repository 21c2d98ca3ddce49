//! tethr-broker - uploads recordings to Tethr and reports broker health.
//!
//! Commands:
//! - `upload <file> [media-type]`: upload a call and follow its status
//! - `status <session-id>...`: print the status of uploaded sessions
//! - `heartbeat`: publish heartbeats until interrupted
//! - `store-password`: save the API password in the OS keychain

mod config;

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tethr_core::models::{
    AudioMediaTypes, CaptureCallContact, CaptureCallRequest, InteractionDirection, SessionStatuses,
};
use tethr_core::{
    Capture, CredentialStore, Heartbeat, HeartbeatConfig, HeartbeatPublisher, SecretString,
    SessionConfig, SessionTransport, TethrError, DEFAULT_DATA_MEDIA_TYPE,
};

use config::BrokerConfig;

// ============================================================================
// Constants
// ============================================================================

/// Delay between status polls after an upload
const STATUS_POLL_INTERVAL_SECS: u64 = 10;

const USAGE: &str = "usage: tethr-broker <command>

commands:
  upload <file> [media-type]   upload a call recording and wait for processing
  status <session-id>...       print the processing status of sessions
  heartbeat                    publish heartbeats until Ctrl-C
  store-password               store the API password in the OS keychain";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the optional log file and must live until exit.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match std::env::var("TETHR_LOG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "tethr-broker.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("upload") => {
            let file = args.get(1).context(USAGE)?;
            upload(file, args.get(2).map(String::as_str)).await
        }
        Some("status") if args.len() > 1 => status(&args[1..]).await,
        Some("heartbeat") => heartbeat().await,
        Some("store-password") => store_password(),
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
}

/// Cancelled on the first Ctrl-C; a second one exits immediately.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let handle = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Ctrl+C - shutting down (press again to force)");
            handle.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
    token
}

/// Build the transport and keep it following configuration reloads.
fn start_session(
    config: &BrokerConfig,
    heartbeat_tx: Option<watch::Sender<HeartbeatConfig>>,
    cancel: &CancellationToken,
) -> Result<Arc<SessionTransport>> {
    let session = config.session_config()?;
    let transport = Arc::new(
        SessionTransport::new(session.clone(), config.transport_options())
            .context("Failed to create the session transport")?,
    );

    let (session_tx, session_rx) = watch::channel(session);
    transport.watch_config(session_rx, cancel.clone());
    spawn_reload_listener(session_tx, heartbeat_tx, cancel.clone());

    Ok(transport)
}

/// Re-read configuration on SIGHUP and publish it to the watchers.
#[cfg(unix)]
fn spawn_reload_listener(
    session_tx: watch::Sender<SessionConfig>,
    heartbeat_tx: Option<watch::Sender<HeartbeatConfig>>,
    cancel: CancellationToken,
) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGHUP, configuration reload disabled");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    info!("SIGHUP received, reloading configuration");
                    match BrokerConfig::load().and_then(|c| Ok((c.session_config()?, c.heartbeat_config()))) {
                        Ok((session, heartbeat)) => {
                            session_tx.send_replace(session);
                            if let Some(tx) = &heartbeat_tx {
                                tx.send_replace(heartbeat);
                            }
                        }
                        Err(e) => warn!(error = %format!("{e:#}"), "Configuration reload failed, keeping current settings"),
                    }
                }
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_listener(
    _session_tx: watch::Sender<SessionConfig>,
    _heartbeat_tx: Option<watch::Sender<HeartbeatConfig>>,
    _cancel: CancellationToken,
) {
}

/// Media type for a recording, guessed from its extension.
fn media_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "wav" => AudioMediaTypes::WAVE,
        "mp3" => AudioMediaTypes::MP3,
        "ogg" | "opus" => AudioMediaTypes::OPUS,
        "m4a" | "mp4" => "audio/mp4",
        "wma" => "audio/wma",
        _ => DEFAULT_DATA_MEDIA_TYPE,
    }
}

fn generate_session_id() -> String {
    format!("SDKUploader{}", Local::now().format("%Y%m%d%H%M%S"))
}

fn sample_call_request(session_id: &str) -> CaptureCallRequest {
    let mut request = CaptureCallRequest::new(session_id, Utc::now());
    request.direction = InteractionDirection::Inbound;
    request.number_dialed = Some("555-555-5555".to_string());
    request.participants = vec![
        CaptureCallContact {
            channel: 0,
            contact_type: "Agent".to_string(),
            reference_id: "agent@example.com".to_string(),
            ..CaptureCallContact::default()
        },
        CaptureCallContact {
            channel: 1,
            contact_type: "Customer".to_string(),
            ..CaptureCallContact::default()
        },
    ];
    request
}

/// Upload a call, then poll until processing reaches a final state
async fn upload(file: &str, media_type: Option<&str>) -> Result<()> {
    let cancel = shutdown_token();
    let config = BrokerConfig::load()?;
    let transport = start_session(&config, None, &cancel)?;
    let capture = Capture::new(transport);

    let media_type = media_type.unwrap_or_else(|| media_type_for_path(Path::new(file)));
    let session_id = generate_session_id();

    let response = capture
        .upload_call_file(sample_call_request(&session_id), file, media_type, &cancel)
        .await
        .with_context(|| format!("Failed to upload {file}"))?;
    info!(session_id = %session_id, tethr_id = %response.id, "Uploaded call");

    // Processing can take hours for large batches; the webhook is the better
    // fit for production, this loop is for interactive use.
    loop {
        let status = match capture.get_session_status(&session_id, &cancel).await {
            Ok(status) => status.status,
            Err(TethrError::Cancelled) => break,
            Err(TethrError::NotFound(_)) => SessionStatuses::NotFound,
            Err(e) => return Err(e).context("Failed to read session status"),
        };
        println!("{session_id}\t{status}");
        if status.is_final() {
            break;
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(STATUS_POLL_INTERVAL_SECS)) => {}
        }
    }

    Ok(())
}

/// Print the status of each session
async fn status(session_ids: &[String]) -> Result<()> {
    let cancel = shutdown_token();
    let config = BrokerConfig::load()?;
    let transport = start_session(&config, None, &cancel)?;

    let response = Capture::new(transport)
        .get_session_statuses(session_ids, &cancel)
        .await
        .context("Failed to read session statuses")?;

    for session_id in session_ids {
        match response.find(session_id) {
            Some(status) => println!("{session_id}\t{}\t{}", status.status, status.call_id),
            None => println!("{session_id}\t{}", SessionStatuses::NotFound),
        }
    }
    Ok(())
}

/// Publish heartbeats until Ctrl-C
async fn heartbeat() -> Result<()> {
    let cancel = shutdown_token();
    let config = BrokerConfig::load()?;

    let (heartbeat_tx, heartbeat_rx) = watch::channel(config.heartbeat_config());
    let transport = start_session(&config, Some(heartbeat_tx), &cancel)?;

    let mut publisher = HeartbeatPublisher::new(Arc::new(Heartbeat::new(transport)), heartbeat_rx);
    publisher.start()?;
    info!("Publishing heartbeats, press Ctrl-C to stop");

    cancel.cancelled().await;
    publisher.stop().await.context("Heartbeat publisher did not stop cleanly")?;
    Ok(())
}

/// Prompt for the API password and store it in the OS keychain
fn store_password() -> Result<()> {
    let config = BrokerConfig::load()?;
    let api_user = match config.api_user.clone() {
        Some(api_user) => api_user,
        None => {
            eprint!("API user: ");
            io::stderr().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line.trim().to_string()
        }
    };
    if api_user.is_empty() {
        anyhow::bail!("API user is required");
    }

    let password = SecretString::new(rpassword::prompt_password(format!("Password for {api_user}: "))?);
    if password.is_empty() {
        anyhow::bail!("Password must not be empty");
    }

    CredentialStore::store(&api_user, &password).context("Failed to store password")?;
    println!("Password for {api_user} stored in the OS keychain");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_for_path() {
        assert_eq!(media_type_for_path(Path::new("call.WAV")), "audio/wav");
        assert_eq!(media_type_for_path(Path::new("/tmp/call.mp3")), "audio/mp3");
        assert_eq!(media_type_for_path(Path::new("call.opus")), "audio/ogg");
        assert_eq!(media_type_for_path(Path::new("call")), DEFAULT_DATA_MEDIA_TYPE);
    }

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        assert!(id.starts_with("SDKUploader"));
        let stamp = &id["SDKUploader".len()..];
        assert_eq!(stamp.len(), 14);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_sample_call_request_is_valid() {
        let request = sample_call_request("SDKUploader20240301120000");
        request.validate().unwrap();
        assert_eq!(request.participants.len(), 2);
    }
}
