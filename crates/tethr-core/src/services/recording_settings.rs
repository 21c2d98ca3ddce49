//! Recording sources configured on the service.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::{Result, SessionTransport};
use crate::models::RecordingSettingSummary;

const RECORDING_SETTINGS_PATH: &str = "/sources/v1/recordingSettings";

#[derive(Clone)]
pub struct RecordingSettings {
    transport: Arc<SessionTransport>,
}

impl RecordingSettings {
    pub fn new(transport: Arc<SessionTransport>) -> Self {
        Self { transport }
    }

    /// Summaries of every recording setting. A `null` answer is an empty list.
    pub async fn get_summaries(&self, cancel: &CancellationToken) -> Result<Vec<RecordingSettingSummary>> {
        Ok(self
            .transport
            .get_optional(RECORDING_SETTINGS_PATH, cancel)
            .await?
            .unwrap_or_default())
    }
}
