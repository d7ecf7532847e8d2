//! Handshake authentication: runs before the upgrade is accepted, so a
//! rejected client never touches the presence registry.

use chat_auth::credential::CredentialSources;
use chat_auth::error::AuthFailure;
use chat_auth::verifier::IdentityVerifier;
use chat_core::types::id::UserId;

/// Identity attached to an accepted handshake.
#[derive(Debug, Clone)]
pub struct AuthenticatedConnection {
    /// User ID.
    pub user_id: UserId,
    /// Display name, relayed as `callerName` on outgoing calls.
    pub display_name: String,
}

/// Authenticates WebSocket handshakes with the shared identity verifier.
#[derive(Clone)]
pub struct WsAuthenticator {
    verifier: IdentityVerifier,
    cookie_name: String,
}

impl std::fmt::Debug for WsAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsAuthenticator")
            .field("cookie_name", &self.cookie_name)
            .finish()
    }
}

impl WsAuthenticator {
    /// Creates a new WebSocket authenticator.
    pub fn new(verifier: IdentityVerifier, cookie_name: impl Into<String>) -> Self {
        Self {
            verifier,
            cookie_name: cookie_name.into(),
        }
    }

    /// Resolve the handshake credential and verify it.
    pub async fn authenticate(
        &self,
        sources: CredentialSources<'_>,
    ) -> Result<AuthenticatedConnection, AuthFailure> {
        let identity = self
            .verifier
            .verify(sources.resolve(&self.cookie_name))
            .await?;

        Ok(AuthenticatedConnection {
            user_id: identity.user_id(),
            display_name: identity.display_name().to_string(),
        })
    }
}
