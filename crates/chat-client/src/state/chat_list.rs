//! Chat list entries and their ordering.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chat_core::types::id::{MessageId, UserId};
use chat_entity::conversation::ChatPartner;
use chat_entity::message::Message;
use chat_entity::user::User;

use super::pending::{PendingMessage, TempId};

/// Identifier of either a confirmed or a provisional message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum MessageRef {
    /// Server-assigned id.
    Confirmed(MessageId),
    /// Local temporary id.
    Pending(TempId),
}

/// What the chat list shows for a conversation's latest message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    /// Which message.
    pub id: MessageRef,
    /// Author.
    pub sender_id: UserId,
    /// Text body.
    pub text: Option<String>,
    /// Whether an image is attached.
    pub has_image: bool,
    /// Creation time (local time for provisional messages).
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for Preview {
    fn from(m: &Message) -> Self {
        Self {
            id: MessageRef::Confirmed(m.id),
            sender_id: m.sender_id,
            text: m.text.clone(),
            has_image: m.image.is_some(),
            created_at: m.created_at,
        }
    }
}

impl From<&PendingMessage> for Preview {
    fn from(p: &PendingMessage) -> Self {
        Self {
            id: MessageRef::Pending(p.temp_id.clone()),
            sender_id: p.sender_id,
            text: p.text.clone(),
            has_image: p.image.is_some(),
            created_at: p.created_at,
        }
    }
}

/// One row of the chat list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatListEntry {
    /// The conversation partner.
    pub partner: User,
    /// Latest message, confirmed or provisional.
    pub last_message: Option<Preview>,
    /// Messages from the partner the local user has not acknowledged.
    pub unread_count: u64,
}

impl ChatListEntry {
    /// An entry with no messages yet.
    pub fn empty(partner: User) -> Self {
        Self {
            partner,
            last_message: None,
            unread_count: 0,
        }
    }

    /// Timestamp the list is ordered by.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_message.as_ref().map(|p| p.created_at)
    }
}

impl From<ChatPartner> for ChatListEntry {
    fn from(partner: ChatPartner) -> Self {
        Self {
            last_message: partner.last_message.as_ref().map(Preview::from),
            unread_count: partner.unread_count,
            partner: partner.user,
        }
    }
}

/// Newest conversation first; conversations without messages last.
pub fn sort_chat_list(entries: &mut [ChatListEntry]) {
    entries.sort_by(|a, b| match (a.last_activity(), b.last_activity()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Whether `entries` is in chat-list order.
pub fn is_sorted(entries: &[ChatListEntry]) -> bool {
    entries.windows(2).all(|w| match (w[0].last_activity(), w[1].last_activity()) {
        (Some(a), Some(b)) => a >= b,
        (None, Some(_)) => false,
        _ => true,
    })
}
