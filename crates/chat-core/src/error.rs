//! Error type shared by every crate of the relay.
//!
//! Lower layers convert their own failures into [`AppError`] so handlers,
//! the relay and the server binary all speak one vocabulary.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

type BoxedCause = Box<dyn StdError + Send + Sync>;

/// Category of an [`AppError`]. The API layer derives the HTTP status from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Missing, malformed or expired credential, or an unknown identity.
    Authentication,
    /// Identity is known but the operation belongs to someone else.
    Authorization,
    /// Malformed request input.
    Validation,
    /// Referenced user, message or call log does not exist.
    NotFound,
    /// Write collided with existing state.
    Conflict,
    /// Message store failure.
    Database,
    /// Invalid or unreadable settings.
    Configuration,
    /// JSON encoding or decoding failed.
    Serialization,
    Io,
    /// Store or relay cannot accept work right now.
    ServiceUnavailable,
    Internal,
}

impl ErrorKind {
    /// Stable upper-snake code used in logs and error bodies.
    pub fn code(self) -> &'static str {
        match self {
            Self::Authentication => "AUTHENTICATION",
            Self::Authorization => "AUTHORIZATION",
            Self::Validation => "VALIDATION",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Database => "DATABASE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::Io => "IO",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::Internal => "INTERNAL",
        }
    }

    /// True when the caller, not the relay, is at fault.
    pub fn is_caller_fault(self) -> bool {
        matches!(
            self,
            Self::Authentication
                | Self::Authorization
                | Self::Validation
                | Self::NotFound
                | Self::Conflict
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Failure carried across crate boundaries.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    pub kind: ErrorKind,
    /// Text safe to return to clients.
    pub message: String,
    #[source]
    pub source: Option<BoxedCause>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Same as [`AppError::new`] but keeps the underlying cause for logging.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: Some(Box::new(source)),
            ..Self::new(kind, message)
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }
}

// The cause is not cloneable; clones keep only what clients see.
impl Clone for AppError {
    fn clone(&self) -> Self {
        Self::new(self.kind, self.message.clone())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        let message = format!("Invalid JSON: {err}");
        Self::with_source(ErrorKind::Serialization, message, err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let message = format!("I/O failure: {err}");
        Self::with_source(ErrorKind::Io, message, err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        let message = format!("Could not load settings: {err}");
        Self::with_source(ErrorKind::Configuration, message, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_code() {
        let err = AppError::not_found("Receiver not found");
        assert_eq!(err.to_string(), "NOT_FOUND: Receiver not found");
    }

    #[test]
    fn test_clone_drops_source() {
        let err = AppError::from(std::io::Error::other("disk gone"));
        assert!(StdError::source(&err).is_some());

        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Io);
        assert!(cloned.source.is_none());
    }

    #[test]
    fn test_json_error_maps_to_serialization() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(AppError::from(parse).kind, ErrorKind::Serialization);
    }

    #[test]
    fn test_caller_fault_split() {
        assert!(ErrorKind::Validation.is_caller_fault());
        assert!(ErrorKind::Authentication.is_caller_fault());
        assert!(!ErrorKind::Database.is_caller_fault());
        assert!(!ErrorKind::Internal.is_caller_fault());
    }
}
