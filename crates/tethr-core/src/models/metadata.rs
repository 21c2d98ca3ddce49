use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{Result, TethrError};

/// Types that carry a free-form JSON metadata element.
pub trait Metadata {
    fn metadata(&self) -> Option<&Value>;

    fn metadata_mut(&mut self) -> &mut Option<Value>;

    /// Replace the metadata with `metadata` serialized to JSON.
    fn set_metadata<T: Serialize>(&mut self, metadata: &T) -> Result<()> {
        let value = serde_json::to_value(metadata)
            .map_err(|e| TethrError::ProcessingFailure(format!("Failed to serialize metadata: {e}")))?;
        *self.metadata_mut() = Some(value);
        Ok(())
    }

    /// Read the metadata back as `T`. `None` when no metadata is set.
    fn metadata_as<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.metadata()
            .filter(|v| !v.is_null())
            .map(|v| {
                T::deserialize(v)
                    .map_err(|e| TethrError::ProcessingFailure(format!("Failed to read metadata: {e}")))
            })
            .transpose()
    }
}

/// Metadata attached after upload to the interaction with this session id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInteractionMetadata {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Metadata attached to every interaction sharing a master call id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterInteractionMetadata {
    pub master_call_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Metadata attached to every interaction in a case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseInteractionMetadata {
    pub case_reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl_metadata!(
    SessionInteractionMetadata,
    MasterInteractionMetadata,
    CaseInteractionMetadata
);
