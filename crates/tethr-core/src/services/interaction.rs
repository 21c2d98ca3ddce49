//! Read, share, and purge processed interactions.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{path_segment, require_ids};
use crate::api::{AudioStream, Result, SessionTransport, TethrError};
use crate::models::{
    InteractionDetailsResponse, InteractionPurgeRequest, InteractionPurgeSummary,
    InteractionShareRequest, InteractionShareResponse,
};

const INTERACTIONS_PATH: &str = "/interactions/v2";
const SHARE_PATH: &str = "/Interactions/v2/token";
const PURGE_PATH: &str = "/interactions/v2/purge";
const PURGE_SESSIONS_PATH: &str = "/interactions/v2/purge/sessions";
const PURGE_CUSTOMER_PATH: &str = "/interactions/v2/purge/customer";

#[derive(Clone)]
pub struct Interaction {
    transport: Arc<SessionTransport>,
}

impl Interaction {
    pub fn new(transport: Arc<SessionTransport>) -> Self {
        Self { transport }
    }

    /// Fetch the analysis of one interaction.
    pub async fn get_details(
        &self,
        interaction_id: &str,
        is_flow: bool,
        cancel: &CancellationToken,
    ) -> Result<InteractionDetailsResponse> {
        let interaction_id = path_segment(interaction_id, "interactionId")?;
        let mut path = format!("{INTERACTIONS_PATH}/{interaction_id}");
        if is_flow {
            path.push_str("?isFlow=true");
        }
        self.transport.get(&path, cancel).await
    }

    /// Stream the interaction's audio as MP3. The caller owns the stream.
    pub async fn get_audio_mp3(&self, interaction_id: &str, cancel: &CancellationToken) -> Result<AudioStream> {
        let interaction_id = path_segment(interaction_id, "interactionId")?;
        self.transport
            .get_stream(&format!("{INTERACTIONS_PATH}/{interaction_id}/audio.mp3"), cancel)
            .await
    }

    /// Create a time limited link that shares an interaction with `email`.
    pub async fn share(
        &self,
        request: &InteractionShareRequest,
        cancel: &CancellationToken,
    ) -> Result<InteractionShareResponse> {
        if request.email.trim().is_empty() {
            return Err(TethrError::InvalidArgument("email is required".to_string()));
        }
        if request.interaction_id.trim().is_empty() {
            return Err(TethrError::InvalidArgument("interactionId is required".to_string()));
        }
        self.transport.post_returning(SHARE_PATH, request, cancel).await
    }

    /// Permanently remove interactions by their interaction ids.
    pub async fn purge_by_interaction_ids(
        &self,
        request: &InteractionPurgeRequest,
        cancel: &CancellationToken,
    ) -> Result<InteractionPurgeSummary> {
        self.purge(PURGE_PATH, request, cancel).await
    }

    /// Permanently remove interactions by the session ids they were uploaded with.
    pub async fn purge_by_session_ids(
        &self,
        request: &InteractionPurgeRequest,
        cancel: &CancellationToken,
    ) -> Result<InteractionPurgeSummary> {
        self.purge(PURGE_SESSIONS_PATH, request, cancel).await
    }

    /// Permanently remove every interaction involving the given customer ids.
    pub async fn purge_by_customer_ids(
        &self,
        request: &InteractionPurgeRequest,
        cancel: &CancellationToken,
    ) -> Result<InteractionPurgeSummary> {
        self.purge(PURGE_CUSTOMER_PATH, request, cancel).await
    }

    async fn purge(
        &self,
        path: &str,
        request: &InteractionPurgeRequest,
        cancel: &CancellationToken,
    ) -> Result<InteractionPurgeSummary> {
        require_ids(&request.ids, "ids")?;
        info!(path = path, count = request.ids.len(), "Requesting purge");
        self.transport.post_returning(path, request, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    use super::*;
    use crate::models::InteractionPurgeStatus;
    use crate::services::test_support::{hits, server_and_transport};

    #[tokio::test]
    async fn test_get_details_with_flow_flag() {
        let (server, transport) = server_and_transport().await;
        Mock::given(method("GET"))
            .and(path("/interactions/v2/int-1"))
            .and(query_param("isFlow", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "int-1",
                "sessionId": "session-1",
                "utcStart": "2024-03-01T12:00:00",
                "utcEnd": "2024-03-01T12:05:00Z",
                "durationMs": 300000
            })))
            .expect(1)
            .mount(&server)
            .await;

        let details = Interaction::new(transport)
            .get_details("int-1", true, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(details.session_id.as_deref(), Some("session-1"));
        assert_eq!(details.duration_ms, 300_000);
        assert_eq!(details.utc_end - details.utc_start, chrono::Duration::minutes(5));
    }

    #[tokio::test]
    async fn test_get_details_without_flow_flag() {
        let (server, transport) = server_and_transport().await;
        Mock::given(method("GET"))
            .and(path("/interactions/v2/int-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "int-2" })))
            .mount(&server)
            .await;

        Interaction::new(transport)
            .get_details("int-2", false, &CancellationToken::new())
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let get = requests.iter().find(|r| r.url.path() == "/interactions/v2/int-2").unwrap();
        assert_eq!(get.url.query(), None);
    }

    #[tokio::test]
    async fn test_get_audio_mp3() {
        let (server, transport) = server_and_transport().await;
        Mock::given(method("GET"))
            .and(path("/interactions/v2/int-1/audio.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"ID3-audio".to_vec(), "audio/mpeg"))
            .mount(&server)
            .await;

        let audio = Interaction::new(transport)
            .get_audio_mp3("int-1", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(audio.into_vec().await.unwrap(), b"ID3-audio");
    }

    #[tokio::test]
    async fn test_share_requires_email_and_id() {
        let (server, transport) = server_and_transport().await;
        let interaction = Interaction::new(transport);
        let cancel = CancellationToken::new();

        let missing_email = InteractionShareRequest {
            email: String::new(),
            interaction_id: "int-1".to_string(),
        };
        assert!(matches!(
            interaction.share(&missing_email, &cancel).await,
            Err(TethrError::InvalidArgument(_))
        ));

        let missing_id = InteractionShareRequest {
            email: "qa@example.com".to_string(),
            interaction_id: " ".to_string(),
        };
        assert!(matches!(
            interaction.share(&missing_id, &cancel).await,
            Err(TethrError::InvalidArgument(_))
        ));

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_share() {
        let (server, transport) = server_and_transport().await;
        Mock::given(method("POST"))
            .and(path(SHARE_PATH))
            .and(body_json(json!({ "email": "qa@example.com", "interactionId": "int-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "expiration": "2024-03-08T00:00:00Z",
                "shareUri": "https://example.com/share/abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = InteractionShareRequest {
            email: "qa@example.com".to_string(),
            interaction_id: "int-1".to_string(),
        };
        let shared = Interaction::new(transport)
            .share(&request, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(shared.share_uri, "https://example.com/share/abc");
    }

    #[tokio::test]
    async fn test_purge_routes() {
        let (server, transport) = server_and_transport().await;
        for route in [PURGE_PATH, PURGE_SESSIONS_PATH, PURGE_CUSTOMER_PATH] {
            Mock::given(method("POST"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "items": [{ "id": "x", "status": "WhatIf" }]
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let interaction = Interaction::new(transport);
        let cancel = CancellationToken::new();
        let request = InteractionPurgeRequest {
            ids: vec!["x".to_string()],
            allow_incomplete_interaction: true,
        };

        let summary = interaction.purge_by_interaction_ids(&request, &cancel).await.unwrap();
        assert_eq!(summary.items[0].status, InteractionPurgeStatus::WhatIf);
        interaction.purge_by_session_ids(&request, &cancel).await.unwrap();
        interaction.purge_by_customer_ids(&request, &cancel).await.unwrap();

        let empty = InteractionPurgeRequest::default();
        assert!(matches!(
            interaction.purge_by_customer_ids(&empty, &cancel).await,
            Err(TethrError::InvalidArgument(_))
        ));
        assert_eq!(hits(&server, PURGE_CUSTOMER_PATH).await, 1);
    }
}
