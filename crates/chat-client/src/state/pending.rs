//! Pending overlay: provisional messages awaiting server confirmation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chat_core::types::id::UserId;

/// Locally generated identifier of a provisional message (`temp-…`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(String);

impl TempId {
    /// A fresh temporary id.
    pub fn generate() -> Self {
        Self(format!("temp-{}", Uuid::new_v4()))
    }

    /// The id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message shown before the server confirmed it. Always unread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMessage {
    /// Temporary id.
    pub temp_id: TempId,
    /// Local user.
    pub sender_id: UserId,
    /// Addressee.
    pub receiver_id: UserId,
    /// Text body.
    pub text: Option<String>,
    /// Image reference.
    pub image: Option<String>,
    /// Local send time.
    pub created_at: DateTime<Utc>,
}

/// Provisional messages in send order. Entries leave only through
/// [`commit`](Self::commit) or [`rollback`](Self::rollback).
#[derive(Debug, Clone, Default)]
pub struct PendingOverlay {
    entries: Vec<PendingMessage>,
}

impl PendingOverlay {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provisional message.
    pub fn push(&mut self, message: PendingMessage) {
        self.entries.push(message);
    }

    /// Remove a confirmed entry.
    pub fn commit(&mut self, temp_id: &TempId) -> Option<PendingMessage> {
        self.take(temp_id)
    }

    /// Remove a failed entry.
    pub fn rollback(&mut self, temp_id: &TempId) -> Option<PendingMessage> {
        self.take(temp_id)
    }

    fn take(&mut self, temp_id: &TempId) -> Option<PendingMessage> {
        let idx = self.entries.iter().position(|p| &p.temp_id == temp_id)?;
        Some(self.entries.remove(idx))
    }

    /// Look up an entry.
    pub fn get(&self, temp_id: &TempId) -> Option<&PendingMessage> {
        self.entries.iter().find(|p| &p.temp_id == temp_id)
    }

    /// Entries addressed to `partner`, in send order.
    pub fn for_partner(&self, partner: UserId) -> impl Iterator<Item = &PendingMessage> {
        self.entries.iter().filter(move |p| p.receiver_id == partner)
    }

    /// Number of provisional messages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
