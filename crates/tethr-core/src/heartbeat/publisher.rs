//! Background heartbeat publisher.
//!
//! `HeartbeatPublisher` owns the worker task and its cancellation token.
//! The worker itself (`heartbeat_worker`) is a plain async function driven
//! by a tokio interval, a config watch channel and the cancellation token.

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::policy::FailureTracker;
use crate::api::{Result, TethrError, SDK_VERSION};
use crate::config::{HeartbeatConfig, StatusCallback};
use crate::models::{HealthStatus, MonitorEvent};

/// Upper bound on `stop()`, final Offline post included.
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

const FINAL_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Destination for monitor events.
pub trait MonitorSink: Send + Sync + 'static {
    fn send(
        &self,
        event: MonitorEvent,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherState {
    /// Interval below one second; ticks are polled but nothing is sent.
    Disabled,
    /// Waiting for the next tick.
    Idle,
    Sending,
    /// Inside a failure streak; most failures go unlogged.
    Suppressing,
    /// Not running.
    Stopped,
}

struct Shared {
    state: Mutex<PublisherState>,
    online: AtomicBool,
    status_callback: RwLock<Option<StatusCallback>>,
}

impl Shared {
    fn set_state(&self, state: PublisherState) {
        *self.state.lock() = state;
    }

    /// Current health from the runtime callback, else the configured one,
    /// else `Healthy`. A panicking callback counts as a failed heartbeat.
    fn evaluate(&self, config: &HeartbeatConfig) -> Result<HealthStatus> {
        let callback = self
            .status_callback
            .read()
            .clone()
            .or_else(|| config.status_callback.clone());

        match callback {
            None => Ok(HealthStatus::Healthy),
            Some(callback) => catch_unwind(AssertUnwindSafe(|| callback())).map_err(|_| {
                TethrError::ProcessingFailure("Status callback panicked".to_string())
            }),
        }
    }
}

/// Host name reported when no broker name is configured.
pub fn machine_name() -> String {
    ["COMPUTERNAME", "HOSTNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn event_for(config: &HeartbeatConfig, status: HealthStatus) -> MonitorEvent {
    MonitorEvent::new(
        status,
        config.name.clone().unwrap_or_else(machine_name),
        Some(
            config
                .software_version
                .clone()
                .unwrap_or_else(|| SDK_VERSION.to_string()),
        ),
    )
}

fn heartbeat_interval(period: Duration) -> Interval {
    let now = Instant::now();
    let mut ticker = interval_at(now.checked_add(period).unwrap_or(now), period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn resting_state(enabled: bool, tracker: &FailureTracker) -> PublisherState {
    if !enabled {
        PublisherState::Disabled
    } else if tracker.is_suppressing() {
        PublisherState::Suppressing
    } else {
        PublisherState::Idle
    }
}

/// Periodically publishes this broker's health until cancelled.
pub struct HeartbeatPublisher<S: MonitorSink> {
    sink: Arc<S>,
    config: watch::Receiver<HeartbeatConfig>,
    shared: Arc<Shared>,
    task_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
}

impl<S: MonitorSink> HeartbeatPublisher<S> {
    /// Create a publisher reading its settings from `config`. Nothing runs
    /// until [`start`](Self::start).
    pub fn new(sink: Arc<S>, config: watch::Receiver<HeartbeatConfig>) -> Self {
        Self {
            sink,
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(PublisherState::Stopped),
                online: AtomicBool::new(false),
                status_callback: RwLock::new(None),
            }),
            task_handle: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Spawn the worker. Must be called inside a tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.task_handle.is_some() {
            return Err(TethrError::Config(
                "Heartbeat publisher already running".to_string(),
            ));
        }

        if self.cancellation.is_cancelled() {
            self.cancellation = CancellationToken::new();
        }

        let handle = tokio::spawn(heartbeat_worker(
            self.sink.clone(),
            self.config.clone(),
            self.shared.clone(),
            self.cancellation.clone(),
        ));
        self.task_handle = Some(handle);
        Ok(())
    }

    /// Cancel the worker and wait for it, including its final Offline post.
    pub async fn stop(&mut self) -> Result<()> {
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            tokio::time::timeout(STOP_TIMEOUT, handle)
                .await
                .map_err(|_| {
                    TethrError::ProcessingFailure("Heartbeat publisher shutdown timeout".to_string())
                })?
                .map_err(|e| TethrError::ProcessingFailure(format!("Heartbeat task join failed: {e}")))?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some() && !self.cancellation.is_cancelled()
    }

    pub fn state(&self) -> PublisherState {
        *self.shared.state.lock()
    }

    /// True once a heartbeat has been accepted and no failure has followed.
    pub fn is_online(&self) -> bool {
        self.shared.online.load(Ordering::Relaxed)
    }

    /// Report health from `callback` instead of the configured source.
    pub fn set_status_callback<F>(&self, callback: F)
    where
        F: Fn() -> HealthStatus + Send + Sync + 'static,
    {
        *self.shared.status_callback.write() = Some(Arc::new(callback));
    }
}

impl<S: MonitorSink> Drop for HeartbeatPublisher<S> {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

async fn heartbeat_worker<S: MonitorSink>(
    sink: Arc<S>,
    mut config_rx: watch::Receiver<HeartbeatConfig>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
) {
    let mut config = config_rx.borrow_and_update().clone();
    let (mut period, mut enabled) = config.schedule();
    info!(interval_secs = period.as_secs(), enabled, "Heartbeat interval set");

    let mut ticker = heartbeat_interval(period);
    let mut tracker = FailureTracker::new();
    let mut watching = true;
    shared.set_state(resting_state(enabled, &tracker));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = config_rx.changed(), if watching => {
                if changed.is_err() {
                    // Sender gone: keep running on the last settings.
                    watching = false;
                    continue;
                }
                config = config_rx.borrow_and_update().clone();
                let (next_period, next_enabled) = config.schedule();
                if next_period != period || next_enabled != enabled {
                    if next_period != period {
                        ticker = heartbeat_interval(next_period);
                    }
                    info!(
                        interval_secs = next_period.as_secs(),
                        enabled = next_enabled,
                        "Heartbeat interval changed"
                    );
                }
                period = next_period;
                enabled = next_enabled;
                shared.set_state(resting_state(enabled, &tracker));
            }
            _ = ticker.tick() => {
                if !enabled {
                    continue;
                }
                shared.set_state(PublisherState::Sending);

                let result = match shared.evaluate(&config) {
                    Ok(status) => sink.send(event_for(&config, status), &cancel).await,
                    Err(e) => Err(e),
                };

                match result {
                    Ok(()) => {
                        if tracker.record_success() {
                            info!("Heartbeat reestablished");
                        }
                    }
                    Err(TethrError::Cancelled) => break,
                    Err(e) => {
                        if tracker.record_failure() {
                            warn!(
                                error = %e,
                                failures = tracker.consecutive_failures(),
                                "Error sending heartbeat"
                            );
                        }
                    }
                }
                shared.online.store(tracker.is_online(), Ordering::Relaxed);
                shared.set_state(resting_state(enabled, &tracker));
            }
        }
    }

    shared.set_state(PublisherState::Stopped);
    shared.online.store(false, Ordering::Relaxed);
    info!("Heartbeat stopped");

    // The loop's token is already cancelled; the last post gets its own.
    let offline = event_for(&config, HealthStatus::Offline);
    let final_cancel = CancellationToken::new();
    match tokio::time::timeout(FINAL_SEND_TIMEOUT, sink.send(offline, &final_cancel)).await {
        Ok(Ok(())) => debug!("Offline heartbeat sent"),
        Ok(Err(e)) => warn!(error = %e, "Error sending heartbeat"),
        Err(_) => warn!("Timed out sending offline heartbeat"),
    }
}
