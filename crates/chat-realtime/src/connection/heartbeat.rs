//! Application-level heartbeat.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;
use tracing::{debug, warn};

use super::handle::ConnectionHandle;
use crate::message::types::ServerEvent;

/// Heartbeat timing.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings.
    pub ping_interval: Duration,
    /// Grace period after a missed interval before the connection is
    /// considered dead.
    pub ping_timeout: Duration,
}

impl HeartbeatConfig {
    /// Silence longer than this closes the connection.
    pub fn max_silence(&self) -> Duration {
        self.ping_interval + self.ping_timeout
    }
}

/// Ping the client every interval and close the handle once it has been
/// silent for longer than [`HeartbeatConfig::max_silence`]. Ends when the
/// handle closes for any reason.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, config: HeartbeatConfig) {
    let mut interval = time::interval(config.ping_interval);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = handle.closed() => break,
            _ = interval.tick() => {}
        }

        let silence = Utc::now() - handle.last_seen().await;
        if silence.to_std().is_ok_and(|s| s > config.max_silence()) {
            warn!(
                conn_id = %handle.id,
                user_id = %handle.user_id,
                silent_ms = silence.num_milliseconds(),
                "Heartbeat timeout, closing connection"
            );
            handle.close();
            break;
        }

        let ping = ServerEvent::Ping {
            timestamp: Utc::now().timestamp_millis(),
        };
        if !handle.send(ping) && !handle.is_open() {
            break;
        }
    }

    debug!(conn_id = %handle.id, "Heartbeat loop ended");
}
