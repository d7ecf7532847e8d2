//! Client timing and endpoint settings.

use std::time::Duration;

/// Settings for [`crate::ChatClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin, e.g. `http://localhost:5001`.
    pub base_url: String,
    /// Delay between opening a conversation and acknowledging its unread
    /// messages, so the badge stays visible briefly.
    pub read_ack_debounce: Duration,
    /// Remote typing flags expire after this much silence.
    pub typing_expiry: Duration,
    /// The local emitter sends `isTyping: false` after this much idle time.
    pub typing_idle: Duration,
}

impl ClientConfig {
    /// Defaults pointed at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// The relay endpoint derived from `base_url`.
    pub fn relay_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{ws_base}/ws")
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            read_ack_debounce: Duration::from_millis(1500),
            typing_expiry: Duration::from_secs(3),
            typing_idle: Duration::from_secs(2),
        }
    }
}
