use serde::{Deserialize, Serialize};

wire_enum! {
    /// Processing state of an uploaded session.
    pub enum SessionStatuses {
        Unknown = 0,
        InProgress = 1,
        Concluded = 2,
        Complete = 3,
        NotFound = 4,
        Excluded = 5,
    }
}

impl SessionStatuses {
    /// No further change is expected once a session reaches one of these.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            SessionStatuses::Complete | SessionStatuses::NotFound | SessionStatuses::Excluded
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStatus {
    pub status: SessionStatuses,
    pub call_id: String,
    pub session_id: String,
    pub duration_sec: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusRequest {
    pub session_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExcludeBulkRequest {
    pub session_ids: Vec<String>,
}

// Older deployments name the list "callSessions".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStatusResponse {
    #[serde(alias = "callSessions")]
    pub sessions: Vec<SessionStatus>,
}

impl SessionStatusResponse {
    pub fn find(&self, session_id: &str) -> Option<&SessionStatus> {
        self.sessions.iter().find(|s| s.session_id == session_id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_status_response_parsing() {
        let response: SessionStatusResponse = serde_json::from_value(json!({
            "callSessions": [
                { "status": "Complete", "callId": "c-1", "sessionId": "s-1", "durationSec": 61 },
                { "status": 1, "sessionId": "s-2" }
            ]
        }))
        .unwrap();

        assert_eq!(response.sessions.len(), 2);
        let first = response.find("s-1").unwrap();
        assert_eq!(first.status, SessionStatuses::Complete);
        assert_eq!(first.duration_sec, 61);
        let second = response.find("s-2").unwrap();
        assert_eq!(second.status, SessionStatuses::InProgress);
        assert!(second.call_id.is_empty());
        assert!(response.find("s-3").is_none());
    }

    #[test]
    fn test_final_statuses() {
        let finals: Vec<_> = SessionStatuses::ALL.iter().filter(|s| s.is_final()).collect();
        assert_eq!(
            finals,
            vec![
                &SessionStatuses::Complete,
                &SessionStatuses::NotFound,
                &SessionStatuses::Excluded
            ]
        );
    }

    #[test]
    fn test_status_request_json() {
        let request = SessionStatusRequest {
            session_ids: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({ "sessionIds": ["a", "b"] })
        );
    }
}
