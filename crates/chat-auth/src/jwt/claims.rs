//! Payload of an HS256 session token.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use chat_core::types::id::UserId;

/// Registered claims only: the subject is the user id, timestamps are Unix
/// seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Claims for `user_id` issued at `now` and valid for `ttl`.
    pub fn for_user(user_id: UserId, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.sub
    }

    /// `None` only for timestamps chrono cannot represent.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}
