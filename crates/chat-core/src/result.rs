//! Convenience result type alias for the chat relay.

use crate::error::AppError;

/// A specialized `Result` type for chat operations.
pub type AppResult<T> = Result<T, AppError>;
