//! Uploads of recorded interactions and session status queries.

use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{path_segment, require_ids};
use crate::api::{Result, SessionTransport, TethrError};
use crate::models::{
    audio_format_for_media_type, CaptureCallRequest, CaptureCaseRequest, CaptureChatRequest,
    CaptureResponse, CaptureStatusHeartbeatRequest, SessionExcludeBulkRequest, SessionStatus,
    SessionStatusRequest, SessionStatusResponse,
};

const CALL_PATH: &str = "/capture/v2/call";
const CHAT_PATH: &str = "/capture/v2/chat";
const CASE_PATH: &str = "/capture/v2/case";
const STATUS_PATH: &str = "/capture/v2/status";
const STATUS_MONITOR_PATH: &str = "/capture/v2/status/monitor";
const EXCLUDE_PATH: &str = "/capture/v2/status/exclude";

/// Capture endpoints: calls, chats, cases, and the status of uploaded sessions.
#[derive(Clone)]
pub struct Capture {
    transport: Arc<SessionTransport>,
}

impl Capture {
    pub fn new(transport: Arc<SessionTransport>) -> Self {
        Self { transport }
    }

    /// Upload a call recording with its metadata.
    ///
    /// An empty `master_id` is dropped and a missing audio format is filled
    /// in from `media_type` before the request is checked.
    pub async fn upload_call<R>(
        &self,
        mut info: CaptureCallRequest,
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

        if info.master_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            info.master_id = None;
        }
        if info.audio.format.as_deref().map_or(true, |f| f.trim().is_empty()) {
            info.audio.format = Some(audio_format_for_media_type(media_type));
        }
        info.validate()?;

        debug!(session_id = %info.session_id, media_type = media_type, "Uploading call");
        self.transport
            .post_multipart(CALL_PATH, &info, audio, media_type, cancel)
            .await
    }

    /// Upload a call recording read from a file on disk.
    pub async fn upload_call_file(
        &self,
        info: CaptureCallRequest,
        audio_path: impl AsRef<Path>,
        media_type: &str,
        cancel: &CancellationToken,
    ) -> Result<CaptureResponse> {
        let audio_path = audio_path.as_ref();
        let mut file = tokio::fs::File::open(audio_path).await.map_err(|e| {
            TethrError::InvalidArgument(format!("Cannot open {}: {e}", audio_path.display()))
        })?;
        self.upload_call(info, &mut file, media_type, cancel).await
    }

    /// Upload a chat transcript.
    pub async fn upload_chat(
        &self,
        info: &CaptureChatRequest,
        cancel: &CancellationToken,
    ) -> Result<CaptureResponse> {
        info.validate()?;
        self.transport.post_returning(CHAT_PATH, info, cancel).await
    }

    /// Upload a case made of messages between contacts.
    pub async fn upload_case(
        &self,
        info: &CaptureCaseRequest,
        cancel: &CancellationToken,
    ) -> Result<CaptureResponse> {
        info.validate()?;
        self.transport.post_returning(CASE_PATH, info, cancel).await
    }

    /// Report the health of the capture integration itself.
    pub async fn send_status_heartbeat(
        &self,
        request: &CaptureStatusHeartbeatRequest,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.transport.post(STATUS_MONITOR_PATH, request, cancel).await
    }

    /// Fetch the processing status of one session.
    pub async fn get_session_status(
        &self,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SessionStatus> {
        let session_id = path_segment(session_id, "sessionId")?;
        self.transport
            .get(&format!("{STATUS_PATH}/{session_id}"), cancel)
            .await
    }

    /// Fetch the processing status of several sessions in one request.
    pub async fn get_session_statuses<S: AsRef<str>>(
        &self,
        session_ids: &[S],
        cancel: &CancellationToken,
    ) -> Result<SessionStatusResponse> {
        require_ids(session_ids, "sessionIds")?;
        let request = SessionStatusRequest {
            session_ids: session_ids.iter().map(|s| s.as_ref().to_string()).collect(),
        };
        self.transport.post_returning(STATUS_PATH, &request, cancel).await
    }

    /// Exclude a session from analysis.
    pub async fn set_session_excluded(&self, session_id: &str, cancel: &CancellationToken) -> Result<()> {
        let session_id = path_segment(session_id, "sessionId")?;
        self.transport
            .post_empty(&format!("{EXCLUDE_PATH}/{session_id}"), cancel)
            .await
    }

    /// Exclude several sessions from analysis.
    pub async fn set_sessions_excluded<S: AsRef<str>>(
        &self,
        session_ids: &[S],
        cancel: &CancellationToken,
    ) -> Result<()> {
        require_ids(session_ids, "sessionIds")?;
        let request = SessionExcludeBulkRequest {
            session_ids: session_ids.iter().map(|s| s.as_ref().to_string()).collect(),
        };
        self.transport.post(EXCLUDE_PATH, &request, cancel).await
    }
}
