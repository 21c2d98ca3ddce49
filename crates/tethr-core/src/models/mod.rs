//! Wire models for the Tethr API.
//!
//! JSON property names are camelCase and absent optional values are omitted
//! on write. Enums serialize as their names and accept either the name or
//! the ordinal on read, except [`HealthStatus`], whose numeric value is the
//! wire form.
//!
//! - `monitor`: heartbeat events and `HealthStatus`
//! - `capture`: call, chat and case uploads
//! - `status`: session status polling and exclusion
//! - `interaction`: interaction details, sharing and purging
//! - `processing`: categories, custom fields and participant types
//! - `metadata`: out-of-band metadata and the `Metadata` trait
//! - `v1`: archive, chat, status, recording settings and call sharing on
//!   the first-generation endpoints

/// Declares a fieldless enum that serializes as its variant name and
/// deserializes from the name (case-insensitive) or its ordinal.
/// The first variant is the default.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $first:ident = $first_ordinal:literal
            $(, $variant:ident = $ordinal:literal)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            #[default]
            $first,
            $($variant,)*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$name::$first $(, $name::$variant)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $name::$first => stringify!($first),
                    $($name::$variant => stringify!($variant),)*
                }
            }

            pub fn ordinal(&self) -> u64 {
                match self {
                    $name::$first => $first_ordinal,
                    $($name::$variant => $ordinal,)*
                }
            }

            pub fn from_ordinal(value: u64) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.ordinal() == value)
            }

            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(name.trim()))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
                struct EnumVisitor;

                impl<'de> serde::de::Visitor<'de> for EnumVisitor {
                    type Value = $name;

                    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                        write!(formatter, "a {} name or ordinal", stringify!($name))
                    }

                    fn visit_str<E: serde::de::Error>(self, v: &str) -> ::std::result::Result<Self::Value, E> {
                        $name::from_name(v)
                            .or_else(|| v.trim().parse().ok().and_then($name::from_ordinal))
                            .ok_or_else(|| E::unknown_variant(v, &[stringify!($first) $(, stringify!($variant))*]))
                    }

                    fn visit_u64<E: serde::de::Error>(self, v: u64) -> ::std::result::Result<Self::Value, E> {
                        $name::from_ordinal(v).ok_or_else(|| {
                            E::invalid_value(serde::de::Unexpected::Unsigned(v), &self)
                        })
                    }

                    fn visit_i64<E: serde::de::Error>(self, v: i64) -> ::std::result::Result<Self::Value, E> {
                        u64::try_from(v)
                            .ok()
                            .and_then($name::from_ordinal)
                            .ok_or_else(|| E::invalid_value(serde::de::Unexpected::Signed(v), &self))
                    }
                }

                deserializer.deserialize_any(EnumVisitor)
            }
        }
    };
}

/// Implements [`Metadata`] for types with a `metadata: Option<Value>` field.
macro_rules! impl_metadata {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::models::Metadata for $ty {
                fn metadata(&self) -> Option<&serde_json::Value> {
                    self.metadata.as_ref()
                }

                fn metadata_mut(&mut self) -> &mut Option<serde_json::Value> {
                    &mut self.metadata
                }
            }
        )+
    };
}

pub mod capture;
pub mod interaction;
pub mod metadata;
pub mod monitor;
pub mod processing;
pub mod status;
pub mod v1;

pub use capture::{
    audio_format_for_media_type, Audio, AudioMediaTypes, CaptureCallContact, CaptureCallRequest,
    CaptureCaseContact, CaptureCaseMessage, CaptureCaseRequest, CaptureChatContact,
    CaptureChatMessage, CaptureChatRequest, CaptureResponse, InteractionDirection,
};
pub use interaction::{
    CallClassification, CallCustomTextHit, CallGroup, CallType, CustomFieldDateTime,
    CustomFieldDouble, CustomFieldLong, CustomFieldString, InteractionDetailsResponse,
    InteractionParticipant, InteractionPurgeRequest, InteractionPurgeStatus,
    InteractionPurgeSummary, InteractionPurgeSummaryItem, InteractionShareRequest,
    InteractionShareResponse, Segment, Utterance, Word,
};
pub use metadata::{
    CaseInteractionMetadata, MasterInteractionMetadata, Metadata, SessionInteractionMetadata,
};
pub use monitor::{CaptureStatusHeartbeatRequest, HealthStatus, MonitorEvent};
pub use processing::{
    ArrayResponse, CategoryGroup, CategoryInfoArrayResponse, CategoryInfoResponse,
    CategoryResultMode, CategoryTrackingMode, CustomFieldResponse, CustomFieldType,
    CustomFieldsResponse, GradientConfig, GradientValue, ParticipantTypeSummary,
    ParticipantTypesResponse, RoundingType, ScoreRange, ScoreRenderOptions,
};
pub use status::{
    SessionExcludeBulkRequest, SessionStatus, SessionStatusRequest, SessionStatusResponse,
    SessionStatuses,
};
pub use v1::{
    ArchiveContact, ArchivedRecordingInfo, CallDirection, CallShareRequest, CallShareResponse,
    ChatContact, ChatMessage, ChatSession, RecordingSettingSummary, SessionRequest,
};

/// Timestamps from the service sometimes arrive without an offset; those
/// are taken as UTC.
pub(crate) mod lenient_utc {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserializer};

    pub fn parse(v: &str) -> Option<DateTime<Utc>> {
        let v = v.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    struct UtcVisitor;

    impl<'de> de::Visitor<'de> for UtcVisitor {
        type Value = Option<DateTime<Utc>>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("an ISO-8601 timestamp")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            if v.is_empty() {
                return Ok(None);
            }
            parse(v)
                .map(Some)
                .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(deserializer.deserialize_any(UtcVisitor)?.unwrap_or_default())
    }

    pub mod option {
        use super::*;

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(UtcVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_wire_enum_accepts_name_or_ordinal() {
        let by_name: SessionStatuses = serde_json::from_value(json!("Complete")).unwrap();
        let by_lower: SessionStatuses = serde_json::from_value(json!("complete")).unwrap();
        let by_ordinal: SessionStatuses = serde_json::from_value(json!(3)).unwrap();
        let by_ordinal_text: SessionStatuses = serde_json::from_value(json!("3")).unwrap();
        assert_eq!(by_name, SessionStatuses::Complete);
        assert_eq!(by_lower, SessionStatuses::Complete);
        assert_eq!(by_ordinal, SessionStatuses::Complete);
        assert_eq!(by_ordinal_text, SessionStatuses::Complete);

        assert!(serde_json::from_value::<SessionStatuses>(json!("Bogus")).is_err());
        assert!(serde_json::from_value::<SessionStatuses>(json!(42)).is_err());
        assert!(serde_json::from_value::<SessionStatuses>(json!(-1)).is_err());
    }

    #[test]
    fn test_wire_enum_writes_name() {
        assert_eq!(
            serde_json::to_value(InteractionDirection::Outbound).unwrap(),
            json!("Outbound")
        );
        assert_eq!(InteractionDirection::default(), InteractionDirection::Unknown);
        assert_eq!(CategoryResultMode::ClassificationsAndSegments.ordinal(), 3);
    }

    #[test]
    fn test_lenient_utc_parse() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(lenient_utc::parse("2024-03-01T12:30:00Z"), Some(expected));
        assert_eq!(lenient_utc::parse("2024-03-01T07:30:00-05:00"), Some(expected));
        assert_eq!(lenient_utc::parse("2024-03-01T12:30:00"), Some(expected));
        assert_eq!(lenient_utc::parse("2024-03-01T12:30:00.000"), Some(expected));
        assert_eq!(lenient_utc::parse("yesterday"), None);
    }
}
