//! Client error types.

use thiserror::Error;

use crate::call::session::CallPhase;

/// Errors surfaced by the client transports and driver.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error body.
    #[error("{code} ({status}): {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Machine-readable code from the error body.
        code: String,
        /// Human-readable message from the error body.
        message: String,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// A response or frame could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The relay connection is gone.
    #[error("relay connection closed")]
    RelayClosed,

    /// A message with neither text nor an image.
    #[error("message is empty")]
    EmptyMessage,

    /// An action that needs an open conversation was called without one.
    #[error("no conversation is open")]
    NoOpenConversation,

    /// A call action is not valid in the current phase.
    #[error("cannot {action} while call is {from:?}")]
    InvalidCallTransition {
        /// Phase at the time of the action.
        from: CallPhase,
        /// The attempted action.
        action: &'static str,
    },
}

impl ClientError {
    /// HTTP status of an API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
