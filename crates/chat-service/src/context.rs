//! Who is acting on a service call.

use chat_core::types::id::UserId;

/// Verified caller, built by the API layer from the resolved identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: UserId,
    pub display_name: String,
}

impl RequestContext {
    pub fn new(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
        }
    }

    /// Whether `other` is the caller. Sending to, calling or reading on
    /// behalf of yourself is rejected by the services.
    pub fn is_self(&self, other: UserId) -> bool {
        self.user_id == other
    }
}
