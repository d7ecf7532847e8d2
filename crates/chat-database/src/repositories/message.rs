//! Message repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use chat_core::error::{AppError, ErrorKind};
use chat_core::result::AppResult;
use chat_core::types::id::{MessageId, UserId};
use chat_entity::conversation::ChatPartner;
use chat_entity::conversation::partner::sort_by_recent_activity;
use chat_entity::message::{Message, NewMessage};

use super::user::UserRepository;
use crate::store::MessageStore;

/// Repository for message persistence and conversation queries.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: PgPool,
    users: UserRepository,
}

impl MessageRepository {
    /// Create a new message repository.
    pub fn new(pool: PgPool) -> Self {
        let users = UserRepository::new(pool.clone());
        Self { pool, users }
    }

    /// Latest message of every conversation `user` takes part in.
    async fn latest_per_partner(&self, user: UserId) -> AppResult<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            "SELECT DISTINCT ON (LEAST(sender_id, receiver_id), GREATEST(sender_id, receiver_id)) \
                    id, sender_id, receiver_id, text, image, read, created_at \
             FROM messages \
             WHERE sender_id = $1 OR receiver_id = $1 \
             ORDER BY LEAST(sender_id, receiver_id), GREATEST(sender_id, receiver_id), \
                      created_at DESC, id DESC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load last messages", e))
    }

    /// Unread counts addressed to `user`, keyed by sender.
    async fn unread_counts(&self, user: UserId) -> AppResult<HashMap<UserId, u64>> {
        let rows: Vec<(UserId, i64)> = sqlx::query_as(
            "SELECT sender_id, COUNT(*) FROM messages \
             WHERE receiver_id = $1 AND read = FALSE GROUP BY sender_id",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count unread messages", e))?;

        Ok(rows
            .into_iter()
            .map(|(sender, count)| (sender, count.max(0) as u64))
            .collect())
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn insert(&self, message: NewMessage) -> AppResult<Message> {
        let row = message.into_message(MessageId::new(), Utc::now());
        sqlx::query_as::<_, Message>(
            "INSERT INTO messages (id, sender_id, receiver_id, text, image, read, created_at) \
             VALUES ($1, $2, $3, $4, $5, FALSE, $6) RETURNING *",
        )
        .bind(row.id)
        .bind(row.sender_id)
        .bind(row.receiver_id)
        .bind(&row.text)
        .bind(&row.image)
        .bind(row.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert message", e))
    }

    async fn conversation(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            "SELECT * FROM messages \
             WHERE (sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1) \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load conversation", e))
    }

    async fn chat_partners(&self, user: UserId) -> AppResult<Vec<ChatPartner>> {
        let latest = self.latest_per_partner(user).await?;
        if latest.is_empty() {
            return Ok(Vec::new());
        }
        let unread = self.unread_counts(user).await?;

        let partner_ids: Vec<UserId> = latest.iter().map(|m| m.counterpart(user)).collect();
        let mut profiles: HashMap<UserId, _> = self
            .users
            .find_many(&partner_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut partners: Vec<ChatPartner> = latest
            .into_iter()
            .filter_map(|message| {
                let partner_id = message.counterpart(user);
                let profile = profiles.remove(&partner_id)?;
                Some(ChatPartner {
                    user: profile,
                    unread_count: unread.get(&partner_id).copied().unwrap_or(0),
                    last_message: Some(message),
                })
            })
            .collect();

        sort_by_recent_activity(&mut partners);
        Ok(partners)
    }

    async fn mark_read(&self, sender: UserId, reader: UserId) -> AppResult<Vec<MessageId>> {
        sqlx::query_scalar::<_, MessageId>(
            "UPDATE messages SET read = TRUE \
             WHERE sender_id = $1 AND receiver_id = $2 AND read = FALSE \
             RETURNING id",
        )
        .bind(sender)
        .bind(reader)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark messages as read", e))
    }
}
