//! `[realtime]` section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How many simultaneous connections a user may hold in the presence
/// registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceMode {
    /// Every tab/device keeps its own connection.
    #[default]
    Multi,
    /// Last connection wins; earlier handles leave presence.
    Single,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    pub presence_mode: PresenceMode,
    /// Cap in `multi` mode. The oldest connection is evicted when exceeded.
    pub max_connections_per_user: usize,
    /// Outbound queue capacity per connection.
    pub channel_buffer_size: usize,
    pub ping_interval_seconds: u64,
    /// Silence tolerated after a ping before the socket is dropped.
    pub ping_timeout_seconds: u64,
    /// Largest accepted inbound text frame, in bytes.
    pub max_message_size: usize,
}

impl RealtimeConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_seconds)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_seconds)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            presence_mode: PresenceMode::Multi,
            max_connections_per_user: 5,
            channel_buffer_size: 256,
            ping_interval_seconds: 30,
            ping_timeout_seconds: 10,
            max_message_size: 64 * 1024,
        }
    }
}
