//! Chat partner summary shown in the chat list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::user::User;

/// A user the viewer has exchanged messages with, plus the latest message
/// and how many messages from that user the viewer has not read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPartner {
    /// The partner's profile, flattened into the summary.
    #[serde(flatten)]
    pub user: User,
    /// Latest message in either direction.
    pub last_message: Option<Message>,
    /// Messages from the partner to the viewer with `read == false`.
    pub unread_count: u64,
}

impl ChatPartner {
    /// Timestamp used to order the chat list.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_message.as_ref().map(|m| m.created_at)
    }
}

/// Sort newest conversation first. Partners without any message go last.
pub fn sort_by_recent_activity(partners: &mut [ChatPartner]) {
    partners.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
}
