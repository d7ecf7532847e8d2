//! Presence registry: user id to live connection handles.
//!
//! Mutations are serialized by the relay's transition lock; lookups may run
//! concurrently from any task.

use std::sync::Arc;

use dashmap::DashMap;

use chat_core::config::realtime::PresenceMode;
use chat_core::types::id::{ConnectionId, UserId};

use crate::connection::handle::ConnectionHandle;

/// Outcome of [`PresenceRegistry::register`].
#[derive(Debug, Default)]
pub struct Registration {
    /// The user had no handle before this one.
    pub came_online: bool,
    /// Handles removed to make room (multi mode, over the per-user cap).
    /// The caller must close them.
    pub evicted: Vec<Arc<ConnectionHandle>>,
    /// Handles replaced in single mode. They leave presence but are not
    /// closed.
    pub replaced: Vec<Arc<ConnectionHandle>>,
}

/// Outcome of a successful [`PresenceRegistry::unregister`].
#[derive(Debug)]
pub struct Unregistration {
    /// The removed handle.
    pub handle: Arc<ConnectionHandle>,
    /// The user has no handle left.
    pub went_offline: bool,
}

/// Thread-safe map of all registered connections.
#[derive(Debug)]
pub struct PresenceRegistry {
    mode: PresenceMode,
    max_per_user: usize,
    /// User ID to handles, oldest first.
    by_user: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
    /// Connection ID to handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl PresenceRegistry {
    /// Creates an empty registry.
    pub fn new(mode: PresenceMode, max_per_user: usize) -> Self {
        Self {
            mode,
            max_per_user: max_per_user.max(1),
            by_user: DashMap::new(),
            by_id: DashMap::new(),
        }
    }

    /// Registry mode.
    pub fn mode(&self) -> PresenceMode {
        self.mode
    }

    /// Add a handle for its user.
    pub fn register(&self, handle: Arc<ConnectionHandle>) -> Registration {
        let mut outcome = Registration::default();
        self.by_id.insert(handle.id, handle.clone());

        let mut entry = self.by_user.entry(handle.user_id).or_default();
        outcome.came_online = entry.is_empty();

        match self.mode {
            PresenceMode::Single => {
                outcome.replaced = std::mem::take(&mut *entry);
            }
            PresenceMode::Multi => {
                let overflow = (entry.len() + 1).saturating_sub(self.max_per_user);
                outcome.evicted = entry.drain(..overflow).collect();
            }
        }
        entry.push(handle);
        drop(entry);

        for old in outcome.replaced.iter().chain(outcome.evicted.iter()) {
            self.by_id.remove(&old.id);
        }

        outcome
    }

    /// Remove exactly the handle `conn_id`. A handle that is no longer
    /// registered (replaced, evicted, or already removed) is a no-op, so a
    /// late disconnect can never remove a newer handle.
    pub fn unregister(&self, conn_id: &ConnectionId) -> Option<Unregistration> {
        let (_, handle) = self.by_id.remove(conn_id)?;

        let mut went_offline = false;
        if let Some(mut handles) = self.by_user.get_mut(&handle.user_id) {
            handles.retain(|h| h.id != *conn_id);
            if handles.is_empty() {
                drop(handles);
                self.by_user.remove_if(&handle.user_id, |_, v| v.is_empty());
                went_offline = true;
            }
        }

        Some(Unregistration {
            handle,
            went_offline,
        })
    }

    /// All live handles for `user_id`; empty when offline.
    pub fn lookup(&self, user_id: &UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// A registered handle by connection id.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Whether the user has at least one handle.
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.by_user
            .get(user_id)
            .is_some_and(|entry| !entry.is_empty())
    }

    /// Online user ids, sorted so broadcasts are deterministic.
    pub fn snapshot(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self
            .by_user
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| *entry.key())
            .collect();
        users.sort_unstable();
        users
    }

    /// Every registered handle.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Total number of registered handles.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Number of online users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Remove everything, returning the handles that were registered.
    pub fn drain(&self) -> Vec<Arc<ConnectionHandle>> {
        let all = self.all_connections();
        self.by_id.clear();
        self.by_user.clear();
        all
    }
}
