//! Relay metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Relay-level counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    connections_total: AtomicU64,
    connections_active: AtomicU64,
    evictions: AtomicU64,
    events_received: AtomicU64,
    events_sent: AtomicU64,
    events_dropped: AtomicU64,
    malformed_frames: AtomicU64,
    calls_failed: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection was registered.
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// A registered connection went away.
    pub fn connection_closed(&self) {
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    /// An older connection was evicted to respect the per-user cap.
    pub fn connection_evicted(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// A client event was accepted.
    pub fn event_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one enqueue attempt.
    pub fn record_send(&self, delivered: bool) {
        if delivered {
            self.events_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.events_dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// A frame failed validation or parsing.
    pub fn malformed_frame(&self) {
        self.malformed_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// A call event found no peer handle.
    pub fn call_failed(&self) {
        self.calls_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            events_received: self.events_received.load(Ordering::Relaxed),
            events_sent: self.events_sent.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            calls_failed: self.calls_failed.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Connections ever registered.
    pub connections_total: u64,
    /// Connections currently registered.
    pub connections_active: u64,
    /// Connections evicted by the per-user cap.
    pub evictions: u64,
    /// Client events accepted.
    pub events_received: u64,
    /// Events enqueued to connections.
    pub events_sent: u64,
    /// Events dropped on a full or closed queue.
    pub events_dropped: u64,
    /// Frames rejected as malformed or oversized.
    pub malformed_frames: u64,
    /// Call events that found no peer.
    pub calls_failed: u64,
}
