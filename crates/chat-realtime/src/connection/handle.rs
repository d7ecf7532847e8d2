//! A single live relay connection.

use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;

use chat_core::types::id::{ConnectionId, UserId};

use super::phase::ConnectionPhase;
use crate::message::types::ServerEvent;

/// A handle to one WebSocket connection.
///
/// Holds the bounded outbound queue drained by the connection's single
/// writer task, so events to one connection are delivered in enqueue order.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// User who owns this connection.
    pub user_id: UserId,
    /// Display name (sent as `callerName`).
    pub display_name: String,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<ServerEvent>,
    phase: AtomicU8,
    last_seen: RwLock<DateTime<Utc>>,
    closed: CancellationToken,
}

impl ConnectionHandle {
    /// Create a handle in the `Authenticated` phase.
    pub fn new(user_id: UserId, display_name: String, sender: mpsc::Sender<ServerEvent>) -> Self {
        let now = Utc::now();
        Self {
            id: ConnectionId::new(),
            user_id,
            display_name,
            connected_at: now,
            sender,
            phase: AtomicU8::new(ConnectionPhase::Authenticated as u8),
            last_seen: RwLock::new(now),
            closed: CancellationToken::new(),
        }
    }

    /// Create a handle with a fresh queue of `capacity`, returning the
    /// receiving half for the writer task.
    pub fn with_queue(
        user_id: UserId,
        display_name: String,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(user_id, display_name, tx), rx)
    }

    /// Enqueue an event without waiting. Returns `false` if the connection
    /// is closed or its queue is full.
    pub fn send(&self, event: ServerEvent) -> bool {
        if !self.is_open() {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(
                    conn_id = %self.id,
                    event = event.name(),
                    "Connection send buffer full, dropping event"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.close();
                false
            }
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> ConnectionPhase {
        ConnectionPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    /// Move to `Active`. No effect once closed.
    pub fn activate(&self) {
        let _ = self.phase.compare_exchange(
            ConnectionPhase::Authenticated as u8,
            ConnectionPhase::Active as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    /// Whether events may still be enqueued.
    pub fn is_open(&self) -> bool {
        self.phase() != ConnectionPhase::Closed
    }

    /// Move to `Closed` and wake the socket tasks.
    pub fn close(&self) {
        self.phase
            .store(ConnectionPhase::Closed as u8, Ordering::SeqCst);
        self.closed.cancel();
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }

    /// A token cancelled on close, for tasks that outlive a borrow.
    pub fn close_token(&self) -> CancellationToken {
        self.closed.clone()
    }

    /// Record inbound traffic (any frame counts as liveness).
    pub async fn touch(&self) {
        *self.last_seen.write().await = Utc::now();
    }

    /// Last time the client sent anything.
    pub async fn last_seen(&self) -> DateTime<Utc> {
        *self.last_seen.read().await
    }
}
