//! Message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use chat_core::types::id::{MessageId, UserId};

/// A persisted message between two users.
///
/// `read` only ever moves from `false` to `true`, and only through the
/// receiver's read acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned identifier.
    pub id: MessageId,
    /// Author.
    pub sender_id: UserId,
    /// Addressee. Never equal to `sender_id`.
    pub receiver_id: UserId,
    /// Text body.
    pub text: Option<String>,
    /// Opaque image reference (URL or data URL).
    pub image: Option<String>,
    /// Whether the receiver has acknowledged the message.
    pub read: bool,
    /// When the store accepted the message.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Check whether `user` is the sender or the receiver.
    pub fn involves(&self, user: UserId) -> bool {
        self.sender_id == user || self.receiver_id == user
    }

    /// The other participant, from `viewer`'s point of view.
    pub fn counterpart(&self, viewer: UserId) -> UserId {
        if self.sender_id == viewer {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    /// Unread and addressed to `reader`.
    pub fn is_unread_for(&self, reader: UserId) -> bool {
        !self.read && self.receiver_id == reader
    }
}

/// Data required to persist a new message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    /// Author.
    pub sender_id: UserId,
    /// Addressee.
    pub receiver_id: UserId,
    /// Text body, already trimmed; `None` when absent or blank.
    pub text: Option<String>,
    /// Image reference.
    pub image: Option<String>,
}

impl NewMessage {
    /// Build a message, normalizing blank text and image to `None`.
    pub fn new(
        sender_id: UserId,
        receiver_id: UserId,
        text: Option<String>,
        image: Option<String>,
    ) -> Self {
        let text = text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let image = image.filter(|i| !i.trim().is_empty());
        Self {
            sender_id,
            receiver_id,
            text,
            image,
        }
    }

    /// A message must carry text, an image, or both.
    pub fn has_content(&self) -> bool {
        self.text.is_some() || self.image.is_some()
    }

    /// Materialize the row the store will hold.
    pub fn into_message(self, id: MessageId, created_at: DateTime<Utc>) -> Message {
        Message {
            id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            text: self.text,
            image: self.image,
            read: false,
            created_at,
        }
    }
}
