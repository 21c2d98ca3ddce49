use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{Result, TethrError};

wire_enum! {
    /// Direction of a call relative to the recording party.
    pub enum InteractionDirection {
        Unknown = 0,
        Inbound = 1,
        Outbound = 2,
        Internal = 3,
    }
}

/// Media types for the audio formats the service accepts directly.
pub struct AudioMediaTypes;

impl AudioMediaTypes {
    pub const WAVE: &'static str = "audio/wav";
    pub const MP3: &'static str = "audio/mp3";
    pub const OPUS: &'static str = "audio/ogg";
}

const MEDIA_TYPE_FORMATS: &[(&str, &str)] = &[
    ("audio/wav", "wav"),
    ("audio/x-wav", "wav"),
    ("audio/wave", "wav"),
    ("audio/vnd.wav", "wav"),
    ("audio/x-wave", "wav"),
    ("audio/mp3", "mp3"),
    ("audio/ogg", "opus"),
    ("audio/mp4", "mp4"),
    ("audio/m4a", "mp4"),
    ("audio/mp4-helium", "mp4helium"),
    ("audio/m4a-helium", "mp4helium"),
    ("audio/wma", "wma"),
    ("audio/wma-helium", "wmahelium"),
];

/// Map a media type to the service's audio format name.
///
/// Unknown media types are passed through unchanged so that formats the
/// service supports but this table lacks still work.
pub fn audio_format_for_media_type(media_type: &str) -> String {
    let lower = media_type.trim().to_ascii_lowercase();
    MEDIA_TYPE_FORMATS
        .iter()
        .find(|(mime, _)| *mime == lower)
        .map(|(_, format)| (*format).to_string())
        .unwrap_or_else(|| media_type.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audio {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureCallContact {
    pub reference_id: String,
    #[serde(rename = "type")]
    pub contact_type: String,
    pub channel: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Metadata sent alongside a call recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureCallRequest {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_end: Option<DateTime<Utc>>,
    #[serde(rename = "Participant", default)]
    pub participants: Vec<CaptureCallContact>,
    #[serde(default)]
    pub direction: InteractionDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_dialed: Option<String>,
    #[serde(default)]
    pub audio: Audio,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl CaptureCallRequest {
    pub fn new<Tz: TimeZone>(session_id: impl Into<String>, utc_start: DateTime<Tz>) -> Self {
        let mut request = Self {
            session_id: session_id.into(),
            ..Self::default()
        };
        request.set_utc_start(utc_start);
        request
    }

    /// Store the start time, converting from any zone to UTC.
    pub fn set_utc_start<Tz: TimeZone>(&mut self, start: DateTime<Tz>) {
        self.utc_start = Some(start.with_timezone(&Utc));
    }

    pub fn set_utc_end<Tz: TimeZone>(&mut self, end: DateTime<Tz>) {
        self.utc_end = Some(end.with_timezone(&Utc));
    }

    pub fn validate(&self) -> Result<()> {
        require(&self.session_id, "sessionId")?;
        if self.participants.is_empty() {
            return Err(TethrError::InvalidArgument("participants is required".to_string()));
        }
        let start = self
            .utc_start
            .ok_or_else(|| TethrError::InvalidArgument("utcStart is required".to_string()))?;
        if let Some(end) = self.utc_end {
            if start > end {
                return Err(TethrError::InvalidArgument(
                    "Start time cannot be greater than end time".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureChatMessage {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_events: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureChatContact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub contact_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub messages: Vec<CaptureChatMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureChatRequest {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub participants: Vec<CaptureChatContact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl CaptureChatRequest {
    pub fn set_utc_start<Tz: TimeZone>(&mut self, start: DateTime<Tz>) {
        self.utc_start = Some(start.with_timezone(&Utc));
    }

    pub fn set_utc_end<Tz: TimeZone>(&mut self, end: DateTime<Tz>) {
        self.utc_end = Some(end.with_timezone(&Utc));
    }

    /// Every message must fall inside the chat window and every
    /// participant needs a reference id and type.
    pub fn validate(&self) -> Result<()> {
        require(&self.session_id, "sessionId")?;
        if self.participants.is_empty() {
            return Err(TethrError::InvalidArgument("participants is required".to_string()));
        }
        let start = self
            .utc_start
            .ok_or_else(|| TethrError::InvalidArgument("utcStart is required".to_string()))?;
        let end = self
            .utc_end
            .ok_or_else(|| TethrError::InvalidArgument("utcEnd is required".to_string()))?;
        if start > end {
            return Err(TethrError::InvalidArgument(
                "Start time cannot be greater than end time".to_string(),
            ));
        }

        for participant in &self.participants {
            require_opt(&participant.reference_id, "referenceId")?;
            require_opt(&participant.contact_type, "type")?;
            for message in &participant.messages {
                let timestamp = message.utc_timestamp.ok_or_else(|| {
                    TethrError::InvalidArgument("utcTimestamp is required".to_string())
                })?;
                if timestamp < start || timestamp > end {
                    return Err(TethrError::InvalidArgument(
                        "Message timestamp must be within the chat session start and end times"
                            .to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureCaseContact {
    pub reference_id: String,
    #[serde(rename = "type")]
    pub contact_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureCaseMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_timestamp: Option<DateTime<Utc>>,
    pub sender_reference_id: String,
    pub channel: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureCaseRequest {
    pub reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub messages: Vec<CaptureCaseMessage>,
    #[serde(default)]
    pub contacts: Vec<CaptureCaseContact>,
}

impl CaptureCaseRequest {
    pub fn validate(&self) -> Result<()> {
        require(&self.reference_id, "referenceId")?;
        let start = self
            .utc_start
            .ok_or_else(|| TethrError::InvalidArgument("utcStart is required".to_string()))?;
        let end = self
            .utc_end
            .ok_or_else(|| TethrError::InvalidArgument("utcEnd is required".to_string()))?;
        if start > end {
            return Err(TethrError::InvalidArgument(
                "Start time cannot be greater than end time".to_string(),
            ));
        }
        if self.contacts.is_empty() {
            return Err(TethrError::InvalidArgument("contacts is required".to_string()));
        }
        for contact in &self.contacts {
            require(&contact.reference_id, "referenceId")?;
            require(&contact.contact_type, "type")?;
        }
        for message in &self.messages {
            if message.utc_timestamp.is_none() {
                return Err(TethrError::InvalidArgument("utcTimestamp is required".to_string()));
            }
            require(&message.sender_reference_id, "senderReferenceId")?;
            require(&message.channel, "channel")?;
            require(&message.content, "content")?;
        }
        Ok(())
    }
}

/// Returned by the service for an accepted upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureResponse {
    #[serde(alias = "callId")]
    pub id: String,
}

impl_metadata!(CaptureCallRequest, CaptureChatRequest, CaptureCaseRequest);

pub(crate) fn require(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(TethrError::InvalidArgument(format!("{name} is required")))
    } else {
        Ok(())
    }
}

fn require_opt(value: &Option<String>, name: &str) -> Result<()> {
    require(value.as_deref().unwrap_or_default(), name)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset};
    use serde_json::json;

    use super::*;

    fn contact() -> CaptureCallContact {
        CaptureCallContact {
            reference_id: "agent-7".to_string(),
            contact_type: "Agent".to_string(),
            channel: 0,
            ..CaptureCallContact::default()
        }
    }

    #[test]
    fn test_local_start_converted_to_utc() {
        let eastern = FixedOffset::west_opt(5 * 3600).unwrap();
        let local_midnight = eastern.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();

        let request = CaptureCallRequest::new("session-1", local_midnight);
        let start = request.utc_start.unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 15, 5, 0, 0).unwrap());
        assert_eq!(start, local_midnight);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["utcStart"], json!("2024-01-15T05:00:00Z"));
    }

    #[test]
    fn test_call_request_json_shape() {
        let mut request = CaptureCallRequest::new("session-1", Utc::now());
        request.participants.push(contact());
        request.direction = InteractionDirection::Inbound;

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["sessionId"], json!("session-1"));
        assert_eq!(value["direction"], json!("Inbound"));
        assert_eq!(value["Participant"][0]["referenceId"], json!("agent-7"));
        assert_eq!(value["Participant"][0]["type"], json!("Agent"));
        assert!(value.get("masterId").is_none());
        assert!(value.get("utcEnd").is_none());
        assert!(value.get("metadata").is_none());
        assert!(value["Participant"][0].get("email").is_none());
    }

    #[test]
    fn test_call_request_validation() {
        let start = Utc::now();
        let mut request = CaptureCallRequest::new("session-1", start);
        assert!(matches!(request.validate(), Err(TethrError::InvalidArgument(_))));

        request.participants.push(contact());
        assert!(request.validate().is_ok());

        request.set_utc_end(start + Duration::minutes(5));
        assert!(request.validate().is_ok());

        request.set_utc_end(start - Duration::minutes(5));
        assert!(request.validate().is_err());

        request.utc_end = None;
        request.session_id.clear();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_chat_messages_must_be_inside_window() {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();
        let end = start + Duration::minutes(30);
        let mut request = CaptureChatRequest {
            session_id: "chat-1".to_string(),
            utc_start: Some(start),
            utc_end: Some(end),
            participants: vec![CaptureChatContact {
                reference_id: Some("customer-1".to_string()),
                contact_type: Some("Customer".to_string()),
                messages: vec![CaptureChatMessage {
                    content: "hello".to_string(),
                    utc_timestamp: Some(start + Duration::minutes(1)),
                    custom_events: Vec::new(),
                }],
                ..CaptureChatContact::default()
            }],
            ..CaptureChatRequest::default()
        };
        assert!(request.validate().is_ok());

        request.participants[0].messages[0].utc_timestamp = Some(end + Duration::seconds(1));
        assert!(request.validate().is_err());

        request.participants[0].messages[0].utc_timestamp = Some(end);
        request.participants[0].contact_type = None;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_case_request_requires_contacts() {
        let start = Utc::now();
        let mut request = CaptureCaseRequest {
            reference_id: "case-1".to_string(),
            utc_start: Some(start),
            utc_end: Some(start + Duration::hours(1)),
            ..CaptureCaseRequest::default()
        };
        assert!(request.validate().is_err());

        request.contacts.push(CaptureCaseContact {
            reference_id: "customer-1".to_string(),
            contact_type: "Customer".to_string(),
            ..CaptureCaseContact::default()
        });
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_audio_format_mapping() {
        assert_eq!(audio_format_for_media_type("audio/wav"), "wav");
        assert_eq!(audio_format_for_media_type("Audio/X-WAV"), "wav");
        assert_eq!(audio_format_for_media_type("audio/ogg"), "opus");
        assert_eq!(audio_format_for_media_type("audio/m4a-helium"), "mp4helium");
        assert_eq!(audio_format_for_media_type("audio/flac"), "audio/flac");
    }

    #[test]
    fn test_capture_response_accepts_call_id() {
        let response: CaptureResponse = serde_json::from_value(json!({ "callId": "abc" })).unwrap();
        assert_eq!(response.id, "abc");
        let response: CaptureResponse = serde_json::from_value(json!({ "id": "def" })).unwrap();
        assert_eq!(response.id, "def");
    }
}
