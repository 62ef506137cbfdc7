//! Client error types.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Fallback shown when the server gives no reason.
pub const GENERIC_FAILURE: &str = "Upload failed";

/// Fixed notice for transport-level failures.
pub const TRANSPORT_FAILURE: &str = "Upload failed. Please try again.";

/// Message used when a success body cannot be understood.
pub const INVALID_RESPONSE: &str = "Invalid response from server";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not complete (connect, reset, timeout).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-200 status, with the body's `error` field if present.
    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or(GENERIC_FAILURE))]
    Server { status: u16, message: Option<String> },

    /// 200 with a body that is not a detection result.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    pub fn server(status: u16, message: Option<String>) -> Self {
        Self::Server { status, message }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// HTTP status, for server-reported errors.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the failure happened below HTTP.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Io(_))
    }

    /// Text for the blocking notice shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Transport(_) | ClientError::Io(_) | ClientError::InvalidUrl(_) => {
                TRANSPORT_FAILURE.to_string()
            }
            ClientError::Server { message, .. } => {
                format!("Error: {}", message.as_deref().unwrap_or(GENERIC_FAILURE))
            }
            ClientError::InvalidResponse(_) => format!("Error: {}", INVALID_RESPONSE),
        }
    }
}
