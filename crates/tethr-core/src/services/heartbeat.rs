use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::{Result, SessionTransport, SDK_VERSION};
use crate::heartbeat::{machine_name, MonitorSink};
use crate::models::{HealthStatus, MonitorEvent};

const MONITOR_PATH: &str = "callCapture/v1/monitor";

/// Posts monitor events for this process. Also the sink used by
/// [`HeartbeatPublisher`](crate::heartbeat::HeartbeatPublisher).
#[derive(Clone)]
pub struct Heartbeat {
    transport: Arc<SessionTransport>,
}

impl Heartbeat {
    pub fn new(transport: Arc<SessionTransport>) -> Self {
        Self { transport }
    }

    pub async fn send(&self, event: &MonitorEvent, cancel: &CancellationToken) -> Result<()> {
        self.transport.post(MONITOR_PATH, event, cancel).await
    }

    /// Send `status` stamped with now, this machine's name and the SDK version.
    pub async fn send_status(&self, status: HealthStatus, cancel: &CancellationToken) -> Result<()> {
        let event = MonitorEvent::new(status, machine_name(), Some(SDK_VERSION.to_string()));
        self.send(&event, cancel).await
    }
}

impl MonitorSink for Heartbeat {
    async fn send(&self, event: MonitorEvent, cancel: &CancellationToken) -> Result<()> {
        Heartbeat::send(self, &event, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::Value;
    use tokio::sync::watch;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    use super::*;
    use crate::config::HeartbeatConfig;
    use crate::heartbeat::HeartbeatPublisher;
    use crate::services::test_support::{hits, server_and_transport};

    #[tokio::test]
    async fn test_send_status() {
        let (server, transport) = server_and_transport().await;
        Mock::given(method("POST"))
            .and(path("/callCapture/v1/monitor"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Heartbeat::new(transport)
            .send_status(HealthStatus::Warning, &CancellationToken::new())
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let post = requests
            .iter()
            .find(|r| r.url.path() == "/callCapture/v1/monitor")
            .unwrap();
        let body: Value = serde_json::from_slice(&post.body).unwrap();
        assert_eq!(body["status"], 10);
        assert_eq!(body["name"], machine_name());
        assert_eq!(body["softwareVersion"], SDK_VERSION);
        assert!(body["timeStamp"].is_string());
    }

    #[tokio::test]
    async fn test_publisher_over_http() {
        let (server, transport) = server_and_transport().await;
        Mock::given(method("POST"))
            .and(path("/callCapture/v1/monitor"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let (_tx, rx) = watch::channel(HeartbeatConfig::with_interval(Some(1)));
        let mut publisher = HeartbeatPublisher::new(Arc::new(Heartbeat::new(transport)), rx);
        publisher.start().unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(publisher.is_online());
        publisher.stop().await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let statuses: Vec<u64> = requests
            .iter()
            .filter(|r| r.url.path() == "/callCapture/v1/monitor")
            .filter_map(|r| serde_json::from_slice::<Value>(&r.body).ok())
            .filter_map(|body| body["status"].as_u64())
            .collect();
        assert!(statuses.len() >= 2, "{statuses:?}");
        assert_eq!(statuses.last(), Some(&u64::from(HealthStatus::Offline.value())));
        assert_eq!(hits(&server, "/Token").await, 1);
    }
}
