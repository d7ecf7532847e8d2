//! Store selection.

use std::sync::Arc;

use tracing::info;

use chat_core::config::database::{DatabaseConfig, StoreProvider};
use chat_core::result::AppResult;

use crate::connection::DatabasePool;
use crate::memory::MemoryStore;
use crate::migration::run_migrations;
use crate::repositories::{CallLogRepository, MessageRepository, UserRepository};
use crate::store::{CallLogStore, MessageStore, UserStore};

/// The message store gateway: one handle per store trait, all backed by
/// the same provider.
#[derive(Clone)]
pub struct Stores {
    /// User lookups.
    pub users: Arc<dyn UserStore>,
    /// Message persistence.
    pub messages: Arc<dyn MessageStore>,
    /// Call history.
    pub call_logs: Arc<dyn CallLogStore>,
    /// Present only for the PostgreSQL provider.
    pub pool: Option<DatabasePool>,
}

impl Stores {
    /// Build the stores selected by `config.provider`.
    pub async fn from_config(config: &DatabaseConfig) -> AppResult<Self> {
        match config.provider {
            StoreProvider::Postgres => {
                let db = DatabasePool::connect(config).await?;
                if config.run_migrations {
                    run_migrations(db.pool()).await?;
                }
                Ok(Self::postgres(db))
            }
            StoreProvider::Memory => {
                info!("Using in-memory message store; data will not survive a restart");
                Ok(Self::memory(MemoryStore::new()))
            }
        }
    }

    /// Stores backed by PostgreSQL.
    pub fn postgres(db: DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            messages: Arc::new(MessageRepository::new(pool.clone())),
            call_logs: Arc::new(CallLogRepository::new(pool)),
            pool: Some(db),
        }
    }

    /// Stores backed by one shared [`MemoryStore`].
    pub fn memory(store: MemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            messages: Arc::new(store.clone()),
            call_logs: Arc::new(store),
            pool: None,
        }
    }

    pub fn provider(&self) -> StoreProvider {
        if self.pool.is_some() {
            StoreProvider::Postgres
        } else {
            StoreProvider::Memory
        }
    }

    /// Storage connectivity check. The memory provider is always healthy.
    pub async fn health_check(&self) -> AppResult<bool> {
        match &self.pool {
            Some(db) => db.health_check().await,
            None => Ok(true),
        }
    }

    /// Release pooled connections.
    pub async fn close(&self) {
        if let Some(db) = &self.pool {
            db.close().await;
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores")
            .field("provider", &self.provider())
            .finish()
    }
}
