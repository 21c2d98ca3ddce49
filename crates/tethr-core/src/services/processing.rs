//! Read-only views of how the service is configured to process interactions.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::{Result, SessionTransport};
use crate::models::{CategoryInfoArrayResponse, CustomFieldsResponse, ParticipantTypesResponse};

const CATEGORIES_PATH: &str = "/processing/v2/categories";
const CUSTOM_FIELDS_PATH: &str = "/processing/v2/customFields";
const PARTICIPANT_TYPES_PATH: &str = "/processing/v2/ParticipantRefTypes";

#[derive(Clone)]
pub struct Processing {
    transport: Arc<SessionTransport>,
}

impl Processing {
    pub fn new(transport: Arc<SessionTransport>) -> Self {
        Self { transport }
    }

    /// Fetch the categories interactions are scored against.
    pub async fn get_categories(&self, cancel: &CancellationToken) -> Result<CategoryInfoArrayResponse> {
        self.transport.get(CATEGORIES_PATH, cancel).await
    }

    /// Fetch the custom fields defined for the account.
    pub async fn get_custom_fields(&self, cancel: &CancellationToken) -> Result<CustomFieldsResponse> {
        self.transport.get(CUSTOM_FIELDS_PATH, cancel).await
    }

    /// Fetch the participant reference types known to the account.
    pub async fn get_participant_types(&self, cancel: &CancellationToken) -> Result<ParticipantTypesResponse> {
        self.transport.get(PARTICIPANT_TYPES_PATH, cancel).await
    }
}
