//! Call log repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use chat_core::error::{AppError, ErrorKind};
use chat_core::result::AppResult;
use chat_core::types::id::{CallLogId, UserId};
use chat_entity::call_log::{CallLog, NewCallLog};

use crate::store::CallLogStore;

/// Repository for call history.
#[derive(Debug, Clone)]
pub struct CallLogRepository {
    pool: PgPool,
}

impl CallLogRepository {
    /// Create a new call log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CallLogStore for CallLogRepository {
    async fn insert(&self, log: NewCallLog) -> AppResult<CallLog> {
        let row = log.into_call_log(CallLogId::new(), Utc::now());
        sqlx::query_as::<_, CallLog>(
            "INSERT INTO call_logs (id, caller_id, receiver_id, duration_seconds, outcome, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(row.id)
        .bind(row.caller_id)
        .bind(row.receiver_id)
        .bind(row.duration_seconds)
        .bind(row.outcome)
        .bind(row.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert call log", e))
    }

    async fn for_user(&self, user: UserId) -> AppResult<Vec<CallLog>> {
        sqlx::query_as::<_, CallLog>(
            "SELECT * FROM call_logs WHERE caller_id = $1 OR receiver_id = $1 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list call logs", e))
    }
}
