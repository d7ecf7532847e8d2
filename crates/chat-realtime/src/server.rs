//! The relay engine: presence, routing and counters behind one handle.

use std::sync::Arc;

use tracing::info;

use chat_core::config::realtime::RealtimeConfig;

use crate::connection::heartbeat::HeartbeatConfig;
use crate::metrics::RealtimeMetrics;
use crate::presence::registry::PresenceRegistry;
use crate::relay::EventRelay;

/// Shared by the REST handlers (push after persist) and the `/ws` handler.
#[derive(Clone)]
pub struct RealtimeEngine {
    pub registry: Arc<PresenceRegistry>,
    pub relay: Arc<EventRelay>,
    pub metrics: Arc<RealtimeMetrics>,
    config: RealtimeConfig,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("presence_mode", &self.config.presence_mode)
            .field("online", &self.registry.user_count())
            .finish_non_exhaustive()
    }
}

impl RealtimeEngine {
    pub fn new(config: RealtimeConfig) -> Self {
        let metrics = Arc::new(RealtimeMetrics::new());
        let registry = Arc::new(PresenceRegistry::new(
            config.presence_mode,
            config.max_connections_per_user,
        ));
        let relay = Arc::new(EventRelay::new(
            Arc::clone(&registry),
            Arc::clone(&metrics),
            config.clone(),
        ));

        info!(
            presence_mode = ?config.presence_mode,
            max_per_user = config.max_connections_per_user,
            "Relay engine ready"
        );

        Self {
            registry,
            relay,
            metrics,
            config,
        }
    }

    /// Ping cadence handed to every new connection.
    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig {
            ping_interval: self.config.ping_interval(),
            ping_timeout: self.config.ping_timeout(),
        }
    }

    /// Close every relay connection and empty presence. No presence
    /// broadcasts go out, since nobody is left to receive them.
    pub fn shutdown(&self) {
        let online = self.registry.user_count();
        self.relay.close_all();
        info!(online, "Relay engine stopped");
    }
}
