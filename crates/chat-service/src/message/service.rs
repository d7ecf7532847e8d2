//! Message operations behind `/api/messages`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use chat_core::error::AppError;
use chat_core::types::id::{MessageId, UserId};
use chat_database::store::{MessageStore, UserStore};
use chat_entity::conversation::ChatPartner;
use chat_entity::message::{Message, NewMessage};

use crate::context::RequestContext;
use crate::notify::MessageNotifier;

/// Body of `POST /api/messages/send/{userId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Text body.
    #[serde(default)]
    pub text: Option<String>,
    /// Image reference.
    #[serde(default)]
    pub image: Option<String>,
}

/// Optional body of `POST /api/messages/mark-as-read/{userId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    /// Must equal the caller when present.
    #[serde(default)]
    pub reader_id: Option<UserId>,
}

/// Outcome of a read acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResult {
    /// Messages flipped by this call.
    pub message_ids: Vec<MessageId>,
}

/// Persists messages and pushes committed writes to live connections.
#[derive(Clone)]
pub struct MessageService {
    /// User store.
    users: Arc<dyn UserStore>,
    /// Message store.
    messages: Arc<dyn MessageStore>,
    /// Push seam.
    notifier: Arc<dyn MessageNotifier>,
}

impl std::fmt::Debug for MessageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageService").finish()
    }
}

impl MessageService {
    /// Creates a new message service.
    pub fn new(
        users: Arc<dyn UserStore>,
        messages: Arc<dyn MessageStore>,
        notifier: Arc<dyn MessageNotifier>,
    ) -> Self {
        Self {
            users,
            messages,
            notifier,
        }
    }

    /// Partners with their latest message and unread count, newest first.
    pub async fn chat_partners(&self, ctx: &RequestContext) -> Result<Vec<ChatPartner>, AppError> {
        self.messages.chat_partners(ctx.user_id).await
    }

    /// Full history with `peer_id`, oldest first.
    pub async fn history(
        &self,
        ctx: &RequestContext,
        peer_id: UserId,
    ) -> Result<Vec<Message>, AppError> {
        self.ensure_user_exists(peer_id, "User not found").await?;
        self.messages.conversation(ctx.user_id, peer_id).await
    }

    /// Persist a message to `receiver_id` and push it to both parties.
    ///
    /// Nothing is pushed unless the insert succeeds.
    pub async fn send(
        &self,
        ctx: &RequestContext,
        receiver_id: UserId,
        req: SendMessageRequest,
    ) -> Result<Message, AppError> {
        let draft = NewMessage::new(ctx.user_id, receiver_id, req.text, req.image);
        if !draft.has_content() {
            return Err(AppError::validation("Text or image is required"));
        }
        if ctx.is_self(receiver_id) {
            return Err(AppError::validation("Cannot send messages to yourself"));
        }
        self.ensure_user_exists(receiver_id, "Receiver not found")
            .await?;

        let message = self.messages.insert(draft).await.map_err(|e| {
            warn!(
                sender_id = %ctx.user_id,
                receiver_id = %receiver_id,
                error = %e,
                "Message insert failed"
            );
            e
        })?;

        info!(
            message_id = %message.id,
            sender_id = %message.sender_id,
            receiver_id = %message.receiver_id,
            "Message stored"
        );
        self.notifier.message_created(&message);

        Ok(message)
    }

    /// Flip every unread message from `peer_id` to the caller and tell the
    /// peer which ids changed.
    pub async fn mark_as_read(
        &self,
        ctx: &RequestContext,
        peer_id: UserId,
        req: MarkReadRequest,
    ) -> Result<MarkReadResult, AppError> {
        if let Some(reader_id) = req.reader_id {
            if !ctx.is_self(reader_id) {
                return Err(AppError::authorization(
                    "Cannot acknowledge messages on behalf of another user",
                ));
            }
        }
        self.ensure_user_exists(peer_id, "User not found").await?;

        let message_ids = self.messages.mark_read(peer_id, ctx.user_id).await?;
        if !message_ids.is_empty() {
            info!(
                reader_id = %ctx.user_id,
                sender_id = %peer_id,
                count = message_ids.len(),
                "Messages marked as read"
            );
            self.notifier
                .messages_read(peer_id, ctx.user_id, &message_ids);
        }

        Ok(MarkReadResult { message_ids })
    }

    async fn ensure_user_exists(&self, id: UserId, missing: &str) -> Result<(), AppError> {
        match self.users.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(missing)),
        }
    }
}
