//! In-memory implementation of every store trait.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use chat_core::error::AppError;
use chat_core::result::AppResult;
use chat_core::types::id::{CallLogId, MessageId, UserId};
use chat_entity::call_log::{CallLog, NewCallLog};
use chat_entity::conversation::ChatPartner;
use chat_entity::conversation::partner::sort_by_recent_activity;
use chat_entity::message::{Message, NewMessage};
use chat_entity::user::User;

use crate::store::{CallLogStore, MessageStore, UserStore};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    /// Insertion order is creation order.
    messages: Vec<Message>,
    call_logs: Vec<CallLog>,
}

/// Process-local store. Cloning shares the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages.
    pub async fn message_count(&self) -> usize {
        self.state.read().await.messages.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn list_except(&self, exclude: UserId) -> AppResult<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| u.id != exclude)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(users)
    }

    async fn create(&self, user: &User) -> AppResult<User> {
        let mut state = self.state.write().await;
        if state.users.contains_key(&user.id) {
            return Err(AppError::conflict("User already exists"));
        }
        if let Some(email) = &user.email {
            let taken = state
                .users
                .values()
                .any(|u| u.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)));
            if taken {
                return Err(AppError::conflict("Email already in use"));
            }
        }
        state.users.insert(user.id, user.clone());
        Ok(user.clone())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert(&self, message: NewMessage) -> AppResult<Message> {
        let mut state = self.state.write().await;
        // Strictly increasing so ordering by timestamp matches insertion order.
        let now = Utc::now();
        let created_at = match state.messages.last() {
            Some(last) if last.created_at >= now => last.created_at + Duration::microseconds(1),
            _ => now,
        };
        let row = message.into_message(MessageId::new(), created_at);
        state.messages.push(row.clone());
        Ok(row)
    }

    async fn conversation(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| {
                (m.sender_id == a && m.receiver_id == b) || (m.sender_id == b && m.receiver_id == a)
            })
            .cloned()
            .collect())
    }

    async fn chat_partners(&self, user: UserId) -> AppResult<Vec<ChatPartner>> {
        let state = self.state.read().await;
        let mut latest: HashMap<UserId, &Message> = HashMap::new();
        let mut unread: HashMap<UserId, u64> = HashMap::new();

        for message in state.messages.iter().filter(|m| m.involves(user)) {
            let partner = message.counterpart(user);
            // Later entries in the log win.
            latest.insert(partner, message);
            if message.is_unread_for(user) {
                *unread.entry(partner).or_default() += 1;
            }
        }

        let mut partners: Vec<ChatPartner> = latest
            .into_iter()
            .filter_map(|(partner, message)| {
                let profile = state.users.get(&partner)?.clone();
                Some(ChatPartner {
                    user: profile,
                    last_message: Some(message.clone()),
                    unread_count: unread.get(&partner).copied().unwrap_or(0),
                })
            })
            .collect();

        sort_by_recent_activity(&mut partners);
        Ok(partners)
    }

    async fn mark_read(&self, sender: UserId, reader: UserId) -> AppResult<Vec<MessageId>> {
        let mut state = self.state.write().await;
        let flipped = state
            .messages
            .iter_mut()
            .filter(|m| m.sender_id == sender && m.receiver_id == reader && !m.read)
            .map(|m| {
                m.read = true;
                m.id
            })
            .collect();
        Ok(flipped)
    }
}

#[async_trait]
impl CallLogStore for MemoryStore {
    async fn insert(&self, log: NewCallLog) -> AppResult<CallLog> {
        let row = log.into_call_log(CallLogId::new(), Utc::now());
        self.state.write().await.call_logs.push(row.clone());
        Ok(row)
    }

    async fn for_user(&self, user: UserId) -> AppResult<Vec<CallLog>> {
        let state = self.state.read().await;
        Ok(state
            .call_logs
            .iter()
            .rev()
            .filter(|log| log.caller_id == user || log.receiver_id == user)
            .cloned()
            .collect())
    }
}
