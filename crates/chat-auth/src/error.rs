//! Credential verification failures.

use thiserror::Error;

use chat_core::error::{AppError, ErrorKind};

/// Why a request or handshake could not be tied to a user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    /// No credential was presented.
    #[error("Unauthorized - no token provided")]
    Unauthorized,
    /// The credential is malformed or its signature does not verify.
    #[error("Unauthorized - {0}")]
    InvalidCredential(String),
    /// The credential is well formed but past its expiry.
    #[error("Unauthorized - token has expired")]
    Expired,
    /// The credential verifies but names a user that no longer exists.
    #[error("Unauthorized - user not found")]
    UserNotFound,
    /// The user lookup itself failed.
    #[error("Identity lookup failed: {0}")]
    Lookup(String),
}

impl AuthFailure {
    /// Stable code for logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "missing_credential",
            Self::InvalidCredential(_) => "invalid_credential",
            Self::Expired => "expired_credential",
            Self::UserNotFound => "user_not_found",
            Self::Lookup(_) => "lookup_failed",
        }
    }
}

impl From<AuthFailure> for AppError {
    fn from(failure: AuthFailure) -> Self {
        match failure {
            AuthFailure::Lookup(_) => AppError::new(ErrorKind::Database, failure.to_string()),
            _ => AppError::new(ErrorKind::Authentication, failure.to_string()),
        }
    }
}
