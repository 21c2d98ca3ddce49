use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Health reported by a broker. The numeric values are the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum HealthStatus {
    #[default]
    Unknown = 0,
    Healthy = 1,
    Warning = 10,
    Error = 20,
    Offline = 30,
}

impl HealthStatus {
    pub const ALL: [HealthStatus; 5] = [
        HealthStatus::Unknown,
        HealthStatus::Healthy,
        HealthStatus::Warning,
        HealthStatus::Error,
        HealthStatus::Offline,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| u64::from(s.value()) == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Unknown => "Unknown",
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Warning => "Warning",
            HealthStatus::Error => "Error",
            HealthStatus::Offline => "Offline",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HealthStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.value())
    }
}

impl<'de> Deserialize<'de> for HealthStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatusVisitor;

        impl<'de> de::Visitor<'de> for StatusVisitor {
            type Value = HealthStatus;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a health status value (0, 1, 10, 20, 30) or name")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                HealthStatus::from_value(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .ok()
                    .and_then(HealthStatus::from_value)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                HealthStatus::from_name(v)
                    .or_else(|| v.trim().parse().ok().and_then(HealthStatus::from_value))
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(StatusVisitor)
    }
}

/// Heartbeat posted to the monitor endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorEvent {
    pub status: HealthStatus,
    pub time_stamp: DateTime<Utc>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_version: Option<String>,
}

impl MonitorEvent {
    pub fn new(status: HealthStatus, name: impl Into<String>, software_version: Option<String>) -> Self {
        Self {
            status,
            time_stamp: Utc::now(),
            name: name.into(),
            software_version,
        }
    }
}

/// Capture-status heartbeat, sent through the capture API rather than the
/// monitor endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureStatusHeartbeatRequest {
    pub status: HealthStatus,
    pub time_stamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_version: Option<String>,
}

impl From<MonitorEvent> for CaptureStatusHeartbeatRequest {
    fn from(event: MonitorEvent) -> Self {
        Self {
            status: event.status,
            time_stamp: event.time_stamp,
            name: Some(event.name),
            software_version: event.software_version,
        }
    }
}
