//! Session status and exclusion on the v1 call capture endpoints.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::require_ids;
use crate::api::{Result, SessionTransport};
use crate::models::{SessionRequest, SessionStatus, SessionStatusResponse};

const STATUS_PATH: &str = "/callCapture/v1/status";
const EXCLUDE_PATH: &str = "/callCapture/v1/status/exclude";

fn session_request<S: AsRef<str>>(session_ids: &[S]) -> Result<SessionRequest> {
    require_ids(session_ids, "sessionIds")?;
    Ok(SessionRequest {
        call_session_ids: session_ids.iter().map(|s| s.as_ref().to_string()).collect(),
    })
}

/// Status queries for sessions uploaded through the v1 endpoints. Every
/// call goes through the bulk endpoints.
#[derive(Clone)]
pub struct CallSessionStatus {
    transport: Arc<SessionTransport>,
}

impl CallSessionStatus {
    pub fn new(transport: Arc<SessionTransport>) -> Self {
        Self { transport }
    }

    /// Status of one session, `None` when the service does not list it.
    pub async fn get_session_status(
        &self,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<SessionStatus>> {
        let response = self.get_session_statuses(&[session_id], cancel).await?;
        Ok(response.sessions.into_iter().next())
    }

    pub async fn get_session_statuses<S: AsRef<str>>(
        &self,
        session_ids: &[S],
        cancel: &CancellationToken,
    ) -> Result<SessionStatusResponse> {
        let request = session_request(session_ids)?;
        self.transport.post_returning(STATUS_PATH, &request, cancel).await
    }

    pub async fn set_excluded(&self, session_id: &str, cancel: &CancellationToken) -> Result<()> {
        self.set_excluded_many(&[session_id], cancel).await
    }

    pub async fn set_excluded_many<S: AsRef<str>>(
        &self,
        session_ids: &[S],
        cancel: &CancellationToken,
    ) -> Result<()> {
        let request = session_request(session_ids)?;
        self.transport.post(EXCLUDE_PATH, &request, cancel).await
    }
}
