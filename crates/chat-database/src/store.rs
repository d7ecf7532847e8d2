//! Message store gateway traits.
//!
//! The relay and the HTTP services only talk to storage through these
//! traits. [`crate::repositories`] implements them on PostgreSQL and
//! [`crate::memory`] keeps everything in process.

use async_trait::async_trait;

use chat_core::result::AppResult;
use chat_core::types::id::{MessageId, UserId};
use chat_entity::call_log::{CallLog, NewCallLog};
use chat_entity::conversation::ChatPartner;
use chat_entity::message::{Message, NewMessage};
use chat_entity::user::User;

/// Read access to user records. Accounts are provisioned elsewhere;
/// `create` exists for seeding.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Find a user by primary key.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// All users except `exclude`, ordered by name.
    async fn list_except(&self, exclude: UserId) -> AppResult<Vec<User>>;

    /// Insert a user record.
    async fn create(&self, user: &User) -> AppResult<User>;
}

/// Message persistence.
#[async_trait]
pub trait MessageStore: Send + Sync + 'static {
    /// Persist a new unread message and return the stored row.
    async fn insert(&self, message: NewMessage) -> AppResult<Message>;

    /// Every message exchanged between `a` and `b`, oldest first.
    async fn conversation(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>>;

    /// Partners of `user` with the latest message and the count of unread
    /// messages they sent to `user`, newest conversation first.
    async fn chat_partners(&self, user: UserId) -> AppResult<Vec<ChatPartner>>;

    /// Flip every unread message from `sender` to `reader` to read in one
    /// atomic step and return the ids that changed. Already-read messages
    /// are not returned, so repeating the call yields an empty list.
    async fn mark_read(&self, sender: UserId, reader: UserId) -> AppResult<Vec<MessageId>>;
}

/// Call log persistence.
#[async_trait]
pub trait CallLogStore: Send + Sync + 'static {
    /// Record a finished call.
    async fn insert(&self, log: NewCallLog) -> AppResult<CallLog>;

    /// Logs where `user` is caller or receiver, newest first.
    async fn for_user(&self, user: UserId) -> AppResult<Vec<CallLog>>;
}
