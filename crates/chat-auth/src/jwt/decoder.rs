//! JWT token validation.

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use chat_core::config::auth::AuthConfig;

use super::claims::Claims;
use crate::error::AuthFailure;

/// Validates session token signatures and expiry.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes a token, distinguishing expiry from every other defect.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthFailure> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AuthFailure::Expired,
                JwtErrorKind::InvalidSignature => {
                    AuthFailure::InvalidCredential("invalid token signature".to_string())
                }
                JwtErrorKind::InvalidToken => {
                    AuthFailure::InvalidCredential("invalid token format".to_string())
                }
                _ => AuthFailure::InvalidCredential(format!("token validation failed: {e}")),
            })
    }
}
