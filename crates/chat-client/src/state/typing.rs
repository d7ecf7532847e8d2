//! Typing indicators in both directions.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use chat_core::types::id::UserId;

/// Remote typing flags. A flag set to `true` lapses after `expiry` without
/// a fresh `userTyping` event.
#[derive(Debug, Clone)]
pub struct TypingTracker {
    expiry: Duration,
    typing: HashMap<UserId, Instant>,
}

impl TypingTracker {
    /// Tracker whose flags lapse after `expiry`.
    pub fn new(expiry: Duration) -> Self {
        Self {
            expiry,
            typing: HashMap::new(),
        }
    }

    /// Apply a `userTyping` event.
    pub fn apply(&mut self, user: UserId, is_typing: bool) {
        self.apply_at(user, is_typing, Instant::now());
    }

    /// Apply a `userTyping` event observed at `now`.
    pub fn apply_at(&mut self, user: UserId, is_typing: bool, now: Instant) {
        if is_typing {
            self.typing.insert(user, now);
        } else {
            self.typing.remove(&user);
        }
    }

    /// Whether `user` is typing right now.
    pub fn is_typing(&self, user: UserId) -> bool {
        self.is_typing_at(user, Instant::now())
    }

    /// Whether `user` is typing at `now`.
    pub fn is_typing_at(&self, user: UserId, now: Instant) -> bool {
        self.typing
            .get(&user)
            .is_some_and(|since| now.saturating_duration_since(*since) < self.expiry)
    }

    /// Drop lapsed flags. Returns the users whose flag lapsed.
    pub fn expire(&mut self, now: Instant) -> Vec<UserId> {
        let expiry = self.expiry;
        let mut lapsed = Vec::new();
        self.typing.retain(|user, since| {
            let live = now.saturating_duration_since(*since) < expiry;
            if !live {
                lapsed.push(*user);
            }
            live
        });
        lapsed
    }

    /// Users with a flag still held. Call [`expire`](Self::expire) first to
    /// leave out lapsed ones.
    pub fn active(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.typing.keys().copied().collect();
        users.sort_unstable();
        users
    }

    /// Forget every flag.
    pub fn clear(&mut self) {
        self.typing.clear();
    }
}

/// Decides when the local user's typing state goes on the wire: `true` on
/// the first keystroke, `false` after `idle` without one or when the
/// message is sent or the conversation closes.
#[derive(Debug, Clone)]
pub struct LocalTypingEmitter {
    idle: Duration,
    last_keystroke: Option<Instant>,
}

impl LocalTypingEmitter {
    /// Emitter that stops after `idle`.
    pub fn new(idle: Duration) -> Self {
        Self {
            idle,
            last_keystroke: None,
        }
    }

    /// Record a keystroke. Returns `Some(true)` when a typing event should
    /// be sent.
    pub fn keystroke(&mut self, now: Instant) -> Option<bool> {
        let started = self.last_keystroke.is_none();
        self.last_keystroke = Some(now);
        started.then_some(true)
    }

    /// Check for idleness. Returns `Some(false)` once the idle window has
    /// passed since the last keystroke.
    pub fn poll(&mut self, now: Instant) -> Option<bool> {
        let last = self.last_keystroke?;
        if now.saturating_duration_since(last) >= self.idle {
            self.last_keystroke = None;
            return Some(false);
        }
        None
    }

    /// Stop immediately (message sent, conversation closed).
    pub fn stop(&mut self) -> Option<bool> {
        self.last_keystroke.take().map(|_| false)
    }

    /// When [`poll`](Self::poll) will next report idleness.
    pub fn deadline(&self) -> Option<Instant> {
        self.last_keystroke.map(|last| last + self.idle)
    }

    /// Whether a `true` has been sent without a matching `false`.
    pub fn is_active(&self) -> bool {
        self.last_keystroke.is_some()
    }
}
