//! The identity verifier shared by the HTTP extractor and the WebSocket
//! handshake.

use std::sync::Arc;

use tracing::{debug, error};

use chat_core::types::id::UserId;
use chat_database::store::UserStore;
use chat_entity::user::User;

use crate::error::AuthFailure;
use crate::jwt::JwtDecoder;

/// A token that verified and resolved to an existing user.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    /// The resolved user record.
    pub user: User,
}

impl VerifiedIdentity {
    /// The verified user's id.
    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    /// Name shown to other users (incoming calls).
    pub fn display_name(&self) -> &str {
        self.user.display_name()
    }
}

/// Turns an optional credential into a user identity. Never mutates state.
#[derive(Clone)]
pub struct IdentityVerifier {
    decoder: JwtDecoder,
    users: Arc<dyn UserStore>,
}

impl std::fmt::Debug for IdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityVerifier")
            .field("decoder", &self.decoder)
            .finish()
    }
}

impl IdentityVerifier {
    /// Creates a verifier backed by `users`.
    pub fn new(decoder: JwtDecoder, users: Arc<dyn UserStore>) -> Self {
        Self { decoder, users }
    }

    /// Verify `token` and load its user.
    pub async fn verify(&self, token: Option<&str>) -> Result<VerifiedIdentity, AuthFailure> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthFailure::Unauthorized)?;

        let claims = self.decoder.decode(token)?;
        let user_id = claims.user_id();

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(|e| {
                error!(user_id = %user_id, error = %e, "Identity lookup failed");
                AuthFailure::Lookup(e.message)
            })?
            .ok_or_else(|| {
                debug!(user_id = %user_id, "Token subject has no user record");
                AuthFailure::UserNotFound
            })?;

        Ok(VerifiedIdentity { user })
    }
}
