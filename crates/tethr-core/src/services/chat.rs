//! Chat sessions on the v1 chat endpoint.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::{Result, SessionTransport};
use crate::models::{CaptureResponse, ChatSession};

const CHAT_PATH: &str = "/chatCapture/v1";

#[derive(Clone)]
pub struct Chat {
    transport: Arc<SessionTransport>,
}

impl Chat {
    pub fn new(transport: Arc<SessionTransport>) -> Self {
        Self { transport }
    }

    pub async fn send_chat_session(
        &self,
        session: &ChatSession,
        cancel: &CancellationToken,
    ) -> Result<CaptureResponse> {
        session.validate()?;
        self.transport.post_returning(CHAT_PATH, session, cancel).await
    }
}
