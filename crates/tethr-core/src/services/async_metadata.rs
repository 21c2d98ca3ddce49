//! Metadata that arrives after an interaction was uploaded.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::{Result, SessionTransport};
use crate::models::capture::require;
use crate::models::{CaseInteractionMetadata, MasterInteractionMetadata, SessionInteractionMetadata};

const SESSION_EVENT_PATH: &str = "/callEvent/v1/outofband/event";
const MASTER_CALL_PATH: &str = "/callEvent/v1/outofband/masterCall";
const CASE_PATH: &str = "/callEvent/v1/outofband/case";

/// Attach metadata to interactions that have already been uploaded.
#[derive(Clone)]
pub struct AsyncMetadata {
    transport: Arc<SessionTransport>,
}

impl AsyncMetadata {
    pub fn new(transport: Arc<SessionTransport>) -> Self {
        Self { transport }
    }

    pub async fn send_by_session_id(
        &self,
        event: &SessionInteractionMetadata,
        cancel: &CancellationToken,
    ) -> Result<()> {
        require(&event.session_id, "sessionId")?;
        self.transport.post(SESSION_EVENT_PATH, event, cancel).await
    }

    pub async fn send_by_master_call_id(
        &self,
        event: &MasterInteractionMetadata,
        cancel: &CancellationToken,
    ) -> Result<()> {
        require(&event.master_call_id, "masterCallId")?;
        self.transport.post(MASTER_CALL_PATH, event, cancel).await
    }

    pub async fn send_by_case_reference_id(
        &self,
        event: &CaseInteractionMetadata,
        cancel: &CancellationToken,
    ) -> Result<()> {
        require(&event.case_reference_id, "caseReferenceId")?;
        self.transport.post(CASE_PATH, event, cancel).await
    }
}
