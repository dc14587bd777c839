//! Error taxonomy for one poll cycle.
//!
//! The `Display` text of these errors ends up in the failure notification
//! sent to the user, so it stays short and free of secrets.

use common::notify::NotifyError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("API request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    /// `body` goes to the log, never into the notification text.
    #[error("API returned {status} {reason}")]
    HttpStatus {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("malformed API response: {0}")]
    MalformedResponse(Malformed),

    #[error("homework record has no `{field}` field")]
    MissingField { field: &'static str },

    #[error("unknown homework status: {}", .status.as_deref().unwrap_or("<none>"))]
    UnknownStatus { status: Option<String> },

    #[error(transparent)]
    Notification(#[from] NotifyError),
}

/// What exactly was wrong with a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
    NotAnObject,
    MissingHomeworks,
    HomeworksNotList,
    InvalidJson { reason: String },
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => f.write_str("body is not a mapping"),
            Self::MissingHomeworks => f.write_str("`homeworks` key is missing"),
            Self::HomeworksNotList => f.write_str("`homeworks` is not a list"),
            Self::InvalidJson { reason } => write!(f, "body is not valid JSON ({})", reason),
        }
    }
}

impl From<Malformed> for PollError {
    fn from(kind: Malformed) -> Self {
        Self::MalformedResponse(kind)
    }
}

impl PollError {
    /// Only connection-level failures are worth repeating within one cycle.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
