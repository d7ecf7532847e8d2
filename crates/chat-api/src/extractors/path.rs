//! Typed path parameter helpers.

use chat_core::error::AppError;
use chat_core::types::id::UserId;

use crate::error::ApiError;

/// Parses a user id from a path segment.
pub fn parse_user_id(s: &str) -> Result<UserId, ApiError> {
    s.parse::<UserId>()
        .map_err(|_| AppError::validation(format!("Invalid user id: {s}")).into())
}
