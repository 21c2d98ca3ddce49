use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::capture::InteractionDirection;

wire_enum! {
    pub enum CallType {
        Call = 0,
        Chat = 1,
        Flow = 2,
        Case = 3,
    }
}

wire_enum! {
    pub enum InteractionPurgeStatus {
        Error = 0,
        NotFound = 1,
        Purging = 2,
        WhatIf = 3,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionShareRequest {
    pub email: String,
    pub interaction_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractionShareResponse {
    #[serde(deserialize_with = "super::lenient_utc::deserialize")]
    pub expiration: DateTime<Utc>,
    pub share_uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionPurgeRequest {
    pub ids: Vec<String>,
    #[serde(default)]
    pub allow_incomplete_interaction: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractionPurgeSummary {
    pub items: Vec<InteractionPurgeSummaryItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractionPurgeSummaryItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub status: InteractionPurgeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallGroup {
    pub id: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub group_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallClassification {
    pub id: Option<String>,
    pub category_type: Option<String>,
    pub category_id: Option<String>,
    pub display_name: Option<String>,
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    #[serde(deserialize_with = "super::lenient_utc::option::deserialize")]
    pub utc_start: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "super::lenient_utc::option::deserialize")]
    pub utc_end: Option<DateTime<Utc>>,
    pub value: f64,
    pub orig_value: Option<f64>,
    pub is_overridden: bool,
    pub missed: bool,
    pub content: Option<String>,
    pub from_flow: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallCustomTextHit {
    pub id: Option<String>,
    pub category_type: Option<String>,
    pub category_id: Option<String>,
    pub custom_field_id: Option<String>,
    pub custom_field_hash: Option<String>,
    pub start_idx: i32,
    pub end_idx: i32,
    pub value: f64,
    pub display_name: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Segment {
    pub id: Option<String>,
    pub category_type: Option<String>,
    pub category_id: Option<String>,
    pub display_name: Option<String>,
    pub start_ms: i64,
    pub end_ms: i64,
    #[serde(deserialize_with = "super::lenient_utc::deserialize")]
    pub utc_start: DateTime<Utc>,
    #[serde(deserialize_with = "super::lenient_utc::deserialize")]
    pub utc_end: DateTime<Utc>,
    pub value: f64,
    pub content: Option<String>,
    pub from_flow: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Word {
    pub start_ms: i64,
    pub end_ms: i64,
    pub content: Option<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Utterance {
    pub start_ms: i64,
    pub end_ms: i64,
    #[serde(deserialize_with = "super::lenient_utc::deserialize")]
    pub utc_start: DateTime<Utc>,
    #[serde(deserialize_with = "super::lenient_utc::deserialize")]
    pub utc_end: DateTime<Utc>,
    pub words: Vec<Word>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractionParticipant {
    pub participant_id: u8,
    pub flow_participant_id: i32,
    pub interaction_id: Option<String>,
    pub ref_type: Option<String>,
    pub ref_id: Option<String>,
    pub contact_id: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub is_internal: bool,
    pub segments: Vec<Segment>,
    pub utterances: Vec<Utterance>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomFieldString {
    pub value: Option<String>,
    pub hash: Option<String>,
    pub id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomFieldLong {
    pub value: i64,
    pub id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomFieldDouble {
    pub value: f64,
    pub id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomFieldDateTime {
    #[serde(deserialize_with = "super::lenient_utc::deserialize")]
    pub value: DateTime<Utc>,
    pub id: Option<String>,
    pub display_name: Option<String>,
}

/// Everything the service knows about one processed interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractionDetailsResponse {
    pub id: Option<String>,
    pub session_id: Option<String>,
    pub master_id: Option<String>,
    pub case_reference_id: Option<String>,
    pub collection_id: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub tethr_uri: Option<String>,
    #[serde(deserialize_with = "super::lenient_utc::deserialize")]
    pub utc_start: DateTime<Utc>,
    #[serde(deserialize_with = "super::lenient_utc::deserialize")]
    pub utc_end: DateTime<Utc>,
    pub duration_ms: i64,
    pub audio_duration_ms: i64,
    pub display_name: Option<String>,
    pub custom_groups: Vec<CallGroup>,
    pub metadata: Option<Value>,
    pub classifications: Vec<CallClassification>,
    pub text_hits: Vec<CallCustomTextHit>,
    pub participants: Vec<InteractionParticipant>,
    pub number_dialed: Option<String>,
    pub direction: InteractionDirection,
    pub participant_identification_confidence: Option<f32>,
    pub had_diarization: bool,
    pub interaction_type: CallType,
    pub flow_type_id: Option<String>,
    pub flows: Vec<Value>,
    pub custom_texts: Vec<CustomFieldString>,
    pub custom_strings: Vec<CustomFieldString>,
    pub custom_longs: Vec<CustomFieldLong>,
    pub custom_doubles: Vec<CustomFieldDouble>,
    pub custom_date_times: Vec<CustomFieldDateTime>,
    pub evaluated_custom_fields: Vec<String>,
    pub matched_custom_fields: Vec<String>,
    #[serde(deserialize_with = "super::lenient_utc::deserialize")]
    pub last_updated_utc: DateTime<Utc>,
    pub internal_talk_time_ms: i64,
    pub external_talk_time_ms: i64,
    pub silence_time_ms: i64,
    pub start_silence_time_ms: i64,
    pub end_silence_time_ms: i64,
    pub silence_percent: f64,
    pub internal_talk_percent: f64,
    pub external_talk_percent: f64,
    pub transcript_confidence: Option<i32>,
    pub transcription_ab_test_name: Option<String>,
}

impl_metadata!(InteractionDetailsResponse);
