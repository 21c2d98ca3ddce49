//! Models for the first-generation endpoints (`callCapture/v1`,
//! `chatCapture/v1`, `sources/v1` and `callShare/v1`), still served next to
//! the v2 capture API.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::capture::{require, Audio};
use crate::api::{Result, TethrError};

wire_enum! {
    /// Call direction as the v1 archive endpoint knows it. `Invalid` is the
    /// unset value and is rejected on upload.
    pub enum CallDirection {
        Invalid = 0,
        Unknown = 1,
        Inbound = 2,
        Outbound = 3,
        Internal = 4,
    }
}

/// A participant on an archived call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArchiveContact {
    pub reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Audio channel of this contact; one contact per channel.
    pub channel: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(rename = "type")]
    pub contact_type: String,
}

/// Metadata for a completed recording sent to the archive endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedRecordingInfo {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_call_id: Option<String>,
    #[serde(default)]
    pub direction: CallDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contacts: Vec<ArchiveContact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_dialed: Option<String>,
    #[serde(default)]
    pub audio: Audio,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ArchivedRecordingInfo {
    pub fn new<Tz: TimeZone>(
        session_id: impl Into<String>,
        start_time: DateTime<Tz>,
        end_time: DateTime<Tz>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            start_time: Some(start_time.with_timezone(&Utc)),
            end_time: Some(end_time.with_timezone(&Utc)),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        require(&self.session_id, "sessionId")?;
        if self.contacts.is_empty() {
            return Err(TethrError::InvalidArgument("contacts is required".to_string()));
        }
        let start = self
            .start_time
            .ok_or_else(|| TethrError::InvalidArgument("startTime is required".to_string()))?;
        let end = self
            .end_time
            .ok_or_else(|| TethrError::InvalidArgument("endTime is required".to_string()))?;
        if start > end {
            return Err(TethrError::InvalidArgument(
                "Start time cannot be greater than end time".to_string(),
            ));
        }
        if self.direction == CallDirection::Invalid {
            return Err(TethrError::InvalidArgument("direction is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatContact {
    /// Identifies the contact together with `contact_type`.
    pub reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "type")]
    pub contact_type: String,
    pub messages: Vec<ChatMessage>,
}

/// A complete chat session for the v1 chat endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contacts: Vec<ChatContact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ChatSession {
    pub fn validate(&self) -> Result<()> {
        require(&self.session_id, "sessionId")?;
        if self.contacts.is_empty() {
            return Err(TethrError::InvalidArgument("contacts is required".to_string()));
        }
        if self.utc_start.is_none() {
            return Err(TethrError::InvalidArgument("utcStart is required".to_string()));
        }
        if self.utc_end.is_none() {
            return Err(TethrError::InvalidArgument("utcEnd is required".to_string()));
        }
        Ok(())
    }
}

/// Body of the v1 status and exclude requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub call_session_ids: Vec<String>,
}

/// A recording source configured on the service. Fields this client does
/// not model are kept in `other`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordingSettingSummary {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Request for a guest link to a call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallShareRequest {
    /// Email of the guest who will open the link.
    pub email: String,
    pub call_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallShareResponse {
    #[serde(deserialize_with = "super::lenient_utc::deserialize")]
    pub expiration: DateTime<Utc>,
    pub call_url: String,
}

impl_metadata!(ArchivedRecordingInfo, ChatSession);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::Metadata;

    fn recording() -> ArchivedRecordingInfo {
        let mut info = ArchivedRecordingInfo::new(
            "Test",
            Utc.with_ymd_and_hms(2024, 1, 1, 4, 23, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 4, 30, 0).unwrap(),
        );
        info.direction = CallDirection::Unknown;
        info.contacts.push(ArchiveContact {
            reference_id: "agent-1".to_string(),
            contact_type: "Agent".to_string(),
            ..ArchiveContact::default()
        });
        info
    }

    #[test]
    fn test_recording_info_json() {
        let mut info = recording();
        info.set_metadata(&json!({ "isTest": true })).unwrap();

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["sessionId"], "Test");
        assert_eq!(value["direction"], "Unknown");
        assert_eq!(value["startTime"], "2024-01-01T04:23:00Z");
        assert_eq!(value["contacts"][0]["type"], "Agent");
        assert_eq!(value["metadata"]["isTest"], true);
        assert!(value.get("masterCallId").is_none());
    }

    #[test]
    fn test_recording_info_validation() {
        recording().validate().unwrap();

        let mut unset = recording();
        unset.direction = CallDirection::Invalid;
        assert!(matches!(unset.validate(), Err(TethrError::InvalidArgument(m)) if m.contains("direction")));

        let mut no_end = recording();
        no_end.end_time = None;
        assert!(no_end.validate().is_err());

        let mut no_contacts = recording();
        no_contacts.contacts.clear();
        assert!(no_contacts.validate().is_err());
    }

    #[test]
    fn test_call_direction_ordinals() {
        let direction: CallDirection = serde_json::from_value(json!(2)).unwrap();
        assert_eq!(direction, CallDirection::Inbound);
        assert_eq!(CallDirection::default(), CallDirection::Invalid);
    }

    #[test]
    fn test_recording_setting_keeps_unknown_fields() {
        let summary: RecordingSettingSummary = serde_json::from_value(json!({
            "id": "rs-1",
            "name": "Genesys",
            "enabled": true
        }))
        .unwrap();
        assert_eq!(summary.name, "Genesys");
        assert_eq!(summary.other.get("enabled"), Some(&json!(true)));
    }
}
