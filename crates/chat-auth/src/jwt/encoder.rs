//! JWT token creation.
//!
//! Login lives in the account service; the relay only signs tokens for
//! seeding, local tooling, and tests.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

use chat_core::config::auth::AuthConfig;
use chat_core::error::AppError;
use chat_core::types::id::UserId;

use super::claims::Claims;

/// Creates signed session tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder").field("ttl", &self.ttl).finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: Duration::hours(config.token_ttl_hours as i64),
        }
    }

    /// Signs a token for `user_id` with the configured lifetime.
    pub fn issue(&self, user_id: UserId) -> Result<(String, DateTime<Utc>), AppError> {
        self.issue_with_ttl(user_id, self.ttl)
    }

    /// Signs a token with an explicit lifetime. A negative `ttl` yields an
    /// already expired token.
    pub fn issue_with_ttl(
        &self,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let now = Utc::now();
        let exp = now + ttl;
        let claims = Claims::for_user(user_id, now, ttl);

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode session token: {e}")))?;

        Ok((token, exp))
    }
}
