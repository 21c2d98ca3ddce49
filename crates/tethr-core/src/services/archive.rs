//! Upload of completed call recordings to the v1 archive endpoint.

use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{Result, SessionTransport, TethrError};
use crate::models::{audio_format_for_media_type, ArchivedRecordingInfo, Audio, CaptureResponse};

const ARCHIVE_PATH: &str = "/callCapture/v1/archive";

/// Sends recordings whose audio is complete for the whole call.
#[derive(Clone)]
pub struct ArchivedRecording {
    transport: Arc<SessionTransport>,
}

impl ArchivedRecording {
    pub fn new(transport: Arc<SessionTransport>) -> Self {
        Self { transport }
    }

    /// Upload a recording with its metadata.
    ///
    /// The audio format is always derived from `media_type`; media types
    /// without a known format are passed through as-is.
    pub async fn send_recording<R>(
        &self,
        mut info: ArchivedRecordingInfo,
        audio: &mut R,
        media_type: &str,
        cancel: &CancellationToken,
    ) -> Result<CaptureResponse>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        if media_type.trim().is_empty() {
            return Err(TethrError::InvalidArgument("media type is required".to_string()));
        }
        if info.master_call_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            info.master_call_id = None;
        }
        info.validate()?;
        info.audio = Audio {
            format: Some(audio_format_for_media_type(media_type)),
        };

        debug!(session_id = %info.session_id, media_type = media_type, "Sending archived recording");
        self.transport
            .post_multipart(ARCHIVE_PATH, &info, audio, media_type, cancel)
            .await
    }

    pub async fn send_recording_file(
        &self,
        info: ArchivedRecordingInfo,
        audio_path: impl AsRef<Path>,
        media_type: &str,
        cancel: &CancellationToken,
    ) -> Result<CaptureResponse> {
        let audio_path = audio_path.as_ref();
        let mut file = tokio::fs::File::open(audio_path).await.map_err(|e| {
            TethrError::InvalidArgument(format!("Cannot open {}: {e}", audio_path.display()))
        })?;
        self.send_recording(info, &mut file, media_type, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    use super::*;
    use crate::models::{ArchiveContact, AudioMediaTypes, CallDirection};
    use crate::services::test_support::server_and_transport;

    fn recording() -> ArchivedRecordingInfo {
        let mut info = ArchivedRecordingInfo::new(
            "archive-1",
            Utc.with_ymd_and_hms(2024, 1, 1, 4, 23, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 4, 30, 0).unwrap(),
        );
        info.direction = CallDirection::Inbound;
        info.contacts.push(ArchiveContact {
            reference_id: "agent-1".to_string(),
            contact_type: "Agent".to_string(),
            channel: 0,
            ..ArchiveContact::default()
        });
        info
    }

    #[tokio::test]
    async fn test_send_recording() {
        let (server, transport) = server_and_transport().await;
        Mock::given(method("POST"))
            .and(path(ARCHIVE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "callId": "c-9" })))
            .expect(1)
            .mount(&server)
            .await;

        let mut info = recording();
        info.master_call_id = Some(String::new());
        info.audio.format = Some("stale".to_string());

        let mut audio: &[u8] = b"ID3 mp3 bytes";
        let response = ArchivedRecording::new(transport)
            .send_recording(info, &mut audio, AudioMediaTypes::MP3, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.id, "c-9");

        let requests = server.received_requests().await.unwrap();
        let upload = requests.iter().find(|r| r.url.path() == ARCHIVE_PATH).unwrap();
        let body = String::from_utf8_lossy(&upload.body);
        assert!(body.contains(r#""audio":{"format":"mp3"}"#));
        assert!(body.contains(r#""direction":"Inbound""#));
        assert!(!body.contains("masterCallId"));
        assert!(body.contains("ID3 mp3 bytes"));
    }

    #[tokio::test]
    async fn test_send_recording_rejects_before_any_request() {
        let (server, transport) = server_and_transport().await;
        let archive = ArchivedRecording::new(transport);
        let cancel = CancellationToken::new();

        let mut unset = recording();
        unset.direction = CallDirection::Invalid;
        let mut audio: &[u8] = b"data";
        let err = archive
            .send_recording(unset, &mut audio, AudioMediaTypes::WAVE, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TethrError::InvalidArgument(_)));

        let mut audio: &[u8] = b"data";
        let err = archive
            .send_recording(recording(), &mut audio, "", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TethrError::InvalidArgument(_)));

        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
