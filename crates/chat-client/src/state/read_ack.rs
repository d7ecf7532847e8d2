//! Debounced read acknowledgment.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use chat_core::types::id::UserId;

/// At most one pending acknowledgment at a time. Scheduling a new one or
/// closing the conversation cancels the previous ticket.
#[derive(Debug)]
pub struct ReadAckDebounce {
    delay: Duration,
    current: Option<CancellationToken>,
}

impl ReadAckDebounce {
    /// Debounce with the given delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            current: None,
        }
    }

    /// Schedule an acknowledgment for `partner`.
    pub fn schedule(&mut self, partner: UserId) -> ReadAckTicket {
        self.cancel();
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        ReadAckTicket {
            partner,
            delay: self.delay,
            token,
        }
    }

    /// Cancel the pending acknowledgment, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }
}

impl Drop for ReadAckDebounce {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A scheduled acknowledgment.
#[derive(Debug)]
pub struct ReadAckTicket {
    partner: UserId,
    delay: Duration,
    token: CancellationToken,
}

impl ReadAckTicket {
    /// Partner whose messages will be acknowledged.
    pub fn partner(&self) -> UserId {
        self.partner
    }

    /// Wait out the delay. `true` if it elapsed, `false` if cancelled.
    pub async fn wait(&self) -> bool {
        tokio::select! {
            _ = self.token.cancelled() => false,
            _ = tokio::time::sleep(self.delay) => !self.token.is_cancelled(),
        }
    }
}
