use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TethrError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Unsupported token type {0:?}, only bearer tokens are supported")]
    UnsupportedTokenType(String),

    #[error("Request returned 401 (Unauthorized)")]
    Unauthorized,

    #[error("Request returned 403 (Forbidden)")]
    Forbidden,

    #[error("The requested resource was not found: {0}")]
    NotFound(String),

    /// 400 from the server. Displays exactly the response body.
    #[error("{0}")]
    Validation(String),

    #[error("Unexpected content type ({content_type}) returned from server")]
    UnexpectedResponse { content_type: String },

    #[error("Processing failure: {0}")]
    ProcessingFailure(String),

    #[error("Request failed with status {status}")]
    RequestFailed { status: StatusCode },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Maximum length for error response bodies written to the log
const MAX_LOGGED_BODY_LENGTH: usize = 500;

impl TethrError {
    /// Map a non-success status to the matching error.
    ///
    /// `body` is only consulted for 400; `is_get` enables the 404 mapping,
    /// which only applies to reads.
    pub fn from_status(status: StatusCode, body: Option<String>, is_get: bool, path: &str) -> Self {
        match status.as_u16() {
            400 => TethrError::Validation(body.unwrap_or_default()),
            401 => TethrError::Unauthorized,
            403 => TethrError::Forbidden,
            404 if is_get => TethrError::NotFound(path.to_string()),
            _ => TethrError::RequestFailed { status },
        }
    }

    /// No usable token could be obtained (includes unsupported token types).
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            TethrError::Authentication(_) | TethrError::UnsupportedTokenType(_)
        )
    }

    /// Transient or auth related failures that a caller may reasonably retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TethrError::Unauthorized | TethrError::Network(_) | TethrError::Cancelled
        )
    }

    /// The HTTP status behind this error, when there is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TethrError::Validation(_) => Some(StatusCode::BAD_REQUEST),
            TethrError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            TethrError::Forbidden => Some(StatusCode::FORBIDDEN),
            TethrError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            TethrError::RequestFailed { status } => Some(*status),
            TethrError::Network(e) => e.status(),
            _ => None,
        }
    }

    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_LOGGED_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_LOGGED_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }
}

pub type Result<T> = std::result::Result<T, TethrError>;
