//! Typed façades over [`SessionTransport`](crate::api::SessionTransport).
//!
//! Each façade checks its arguments before any request is made and maps
//! one method to one endpoint.

pub mod archive;
pub mod async_metadata;
pub mod call_share;
pub mod capture;
pub mod chat;
pub mod heartbeat;
pub mod interaction;
pub mod processing;
pub mod recording_settings;
pub mod session_status;

pub use archive::ArchivedRecording;
pub use async_metadata::AsyncMetadata;
pub use call_share::CallShare;
pub use capture::Capture;
pub use chat::Chat;
pub use heartbeat::Heartbeat;
pub use interaction::Interaction;
pub use processing::Processing;
pub use recording_settings::RecordingSettings;
pub use session_status::CallSessionStatus;

use crate::api::{Result, TethrError};

/// Check that an id is safe to splice into a resource path.
pub(crate) fn path_segment<'a>(value: &'a str, name: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TethrError::InvalidArgument(format!("{name} is required")));
    }
    if value
        .chars()
        .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control())
    {
        return Err(TethrError::InvalidArgument(format!(
            "{name} contains characters not allowed in a resource path: {value:?}"
        )));
    }
    Ok(value)
}

pub(crate) fn require_ids<S: AsRef<str>>(ids: &[S], name: &str) -> Result<()> {
    if ids.is_empty() {
        return Err(TethrError::InvalidArgument(format!("{name} is required")));
    }
    if ids.iter().any(|id| id.as_ref().trim().is_empty()) {
        return Err(TethrError::InvalidArgument(format!("{name} must not contain empty ids")));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segment() {
        assert_eq!(path_segment(" abc-123 ", "id").unwrap(), "abc-123");
        for bad in ["", "  ", "a/b", "a?b", "a#b", "a b", "50%"] {
            assert!(
                matches!(path_segment(bad, "id"), Err(TethrError::InvalidArgument(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_require_ids() {
        assert!(require_ids(&["a", "b"], "ids").is_ok());
        assert!(require_ids::<&str>(&[], "ids").is_err());
        assert!(require_ids(&["a", " "], "ids").is_err());
    }
}
