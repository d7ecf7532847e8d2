//! Contact listing.

use std::sync::Arc;

use tracing::debug;

use chat_core::error::AppError;
use chat_core::types::id::UserId;
use chat_database::store::UserStore;
use chat_entity::user::User;

use crate::context::RequestContext;

/// Lists the users the caller can start a conversation with.
#[derive(Clone)]
pub struct ContactService {
    /// User store.
    users: Arc<dyn UserStore>,
}

impl std::fmt::Debug for ContactService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactService").finish()
    }
}

impl ContactService {
    /// Creates a new contact service.
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Every user except the caller, ordered by name.
    pub async fn list_contacts(&self, ctx: &RequestContext) -> Result<Vec<User>, AppError> {
        let contacts = self.users.list_except(ctx.user_id).await?;
        debug!(user_id = %ctx.user_id, count = contacts.len(), "Listed contacts");
        Ok(contacts)
    }

    /// Load a user or fail with not-found.
    pub async fn get_user(&self, id: UserId) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::error::ErrorKind;
    use chat_database::MemoryStore;

    #[tokio::test]
    async fn test_contacts_exclude_self() {
        let store = MemoryStore::new();
        let me = User::new("Me");
        let other = User::new("Other");
        store.create(&me).await.unwrap();
        store.create(&other).await.unwrap();

        let service = ContactService::new(Arc::new(store));
        let contacts = service
            .list_contacts(&RequestContext::new(me.id, "Me"))
            .await
            .unwrap();
        assert_eq!(contacts, vec![other]);
    }

    #[tokio::test]
    async fn test_get_unknown_user() {
        let service = ContactService::new(Arc::new(MemoryStore::new()));
        let err = service.get_user(UserId::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
