//! Guest links to calls on the v1 share endpoint.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::{Result, SessionTransport, TethrError};
use crate::models::{CallShareRequest, CallShareResponse};

const CALL_SHARE_PATH: &str = "callShare/v1/token";

/// Creates links that let a guest open one call. Links expire after eight
/// hours unless the service is configured otherwise.
#[derive(Clone)]
pub struct CallShare {
    transport: Arc<SessionTransport>,
}

impl CallShare {
    pub fn new(transport: Arc<SessionTransport>) -> Self {
        Self { transport }
    }

    pub async fn share_call(
        &self,
        request: &CallShareRequest,
        cancel: &CancellationToken,
    ) -> Result<CallShareResponse> {
        if request.call_id.trim().is_empty() {
            return Err(TethrError::InvalidArgument("callId is required".to_string()));
        }
        if request.email.trim().is_empty() {
            return Err(TethrError::InvalidArgument("email is required".to_string()));
        }
        self.transport.post_returning(CALL_SHARE_PATH, request, cancel).await
    }
}
