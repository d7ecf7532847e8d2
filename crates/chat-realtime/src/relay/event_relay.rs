//! The event relay.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use chat_core::config::realtime::RealtimeConfig;
use chat_core::types::id::{ConnectionId, UserId};

use crate::call::CallSignalingCoordinator;
use crate::connection::authenticator::AuthenticatedConnection;
use crate::connection::handle::ConnectionHandle;
use crate::message::serializer::deserialize_inbound;
use crate::message::types::{ClientEvent, ServerEvent};
use crate::message::validator::validate_inbound;
use crate::metrics::RealtimeMetrics;
use crate::presence::registry::PresenceRegistry;

/// What the socket loop should do after an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Keep reading.
    Continue,
    /// The frame was rejected; an `error` event has been queued and the
    /// connection should be closed.
    Close,
}

/// Routes events between connections and keeps every client's view of the
/// online set in step with the presence registry.
#[derive(Debug)]
pub struct EventRelay {
    registry: Arc<PresenceRegistry>,
    calls: CallSignalingCoordinator,
    metrics: Arc<RealtimeMetrics>,
    config: RealtimeConfig,
    /// Held across registry mutation, snapshot, and broadcast enqueue, so
    /// broadcasts reach every queue in the order the registry changed.
    transition: Mutex<()>,
}

impl EventRelay {
    /// Creates a relay over a shared registry.
    pub fn new(
        registry: Arc<PresenceRegistry>,
        metrics: Arc<RealtimeMetrics>,
        config: RealtimeConfig,
    ) -> Self {
        let calls = CallSignalingCoordinator::new(registry.clone(), metrics.clone());
        Self {
            registry,
            calls,
            metrics,
            config,
            transition: Mutex::new(()),
        }
    }

    /// The presence registry.
    pub fn registry(&self) -> &Arc<PresenceRegistry> {
        &self.registry
    }

    /// Relay counters.
    pub fn metrics(&self) -> &Arc<RealtimeMetrics> {
        &self.metrics
    }

    fn lock_transition(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        self.transition
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a verified connection and broadcast the new online set.
    ///
    /// Returns the handle and the receiving end of its outbound queue.
    pub fn connect(
        &self,
        identity: &AuthenticatedConnection,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
        let (handle, rx) = ConnectionHandle::with_queue(
            identity.user_id,
            identity.display_name.clone(),
            self.config.channel_buffer_size,
        );
        let handle = Arc::new(handle);

        {
            let _guard = self.lock_transition();
            let outcome = self.registry.register(handle.clone());
            handle.activate();

            for evicted in &outcome.evicted {
                warn!(
                    conn_id = %evicted.id,
                    user_id = %evicted.user_id,
                    max = self.config.max_connections_per_user,
                    "User at max connections, closing oldest"
                );
                evicted.close();
                self.metrics.connection_evicted();
                self.metrics.connection_closed();
            }
            for replaced in &outcome.replaced {
                debug!(
                    conn_id = %replaced.id,
                    user_id = %replaced.user_id,
                    "Connection replaced in presence"
                );
                self.metrics.connection_closed();
            }

            self.broadcast_online_users();
        }

        self.metrics.connection_opened();
        info!(
            conn_id = %handle.id,
            user_id = %handle.user_id,
            online = self.registry.user_count(),
            "Relay connection registered"
        );

        (handle, rx)
    }

    /// Unregister a connection and broadcast the new online set. Unknown
    /// or already replaced handles change nothing and broadcast nothing.
    pub fn disconnect(&self, conn_id: &ConnectionId) {
        let removed = {
            let _guard = self.lock_transition();
            let removed = self.registry.unregister(conn_id);
            if removed.is_some() {
                self.broadcast_online_users();
            }
            removed
        };

        if let Some(removed) = removed {
            removed.handle.close();
            self.metrics.connection_closed();
            info!(
                conn_id = %conn_id,
                user_id = %removed.handle.user_id,
                went_offline = removed.went_offline,
                "Relay connection unregistered"
            );
        }
    }

    /// Enqueue `getOnlineUsers` with the current snapshot to every handle.
    /// Callers hold the transition lock.
    fn broadcast_online_users(&self) {
        let snapshot = self.registry.snapshot();
        for handle in self.registry.all_connections() {
            let delivered = handle.send(ServerEvent::GetOnlineUsers(snapshot.clone()));
            self.metrics.record_send(delivered);
        }
    }

    /// Handle one text frame from `handle`.
    pub async fn handle_inbound(&self, handle: &ConnectionHandle, raw: &str) -> Disposition {
        handle.touch().await;

        let event = match validate_inbound(raw, self.config.max_message_size)
            .and_then(|()| deserialize_inbound(raw).map_err(Into::into))
        {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    conn_id = %handle.id,
                    user_id = %handle.user_id,
                    error = %e.message,
                    "Rejecting malformed relay frame"
                );
                self.metrics.malformed_frame();
                handle.send(ServerEvent::Error {
                    code: "INVALID_MESSAGE".to_string(),
                    message: e.message,
                });
                return Disposition::Close;
            }
        };

        self.metrics.event_received();
        debug!(conn_id = %handle.id, event = event.name(), "Relay event");
        self.dispatch(handle, event);
        Disposition::Continue
    }

    fn dispatch(&self, handle: &ConnectionHandle, event: ClientEvent) {
        match event {
            ClientEvent::Typing {
                receiver_id,
                is_typing,
            } => self.relay_typing(handle.user_id, receiver_id, is_typing),
            ClientEvent::CallUser { receiver_id, offer } => {
                self.calls.call_user(handle, receiver_id, offer)
            }
            ClientEvent::AnswerCall { caller_id, answer } => {
                self.calls.answer_call(handle, caller_id, answer)
            }
            ClientEvent::RejectCall { caller_id } => self.calls.reject_call(handle, caller_id),
            ClientEvent::IceCandidate {
                receiver_id,
                candidate,
            } => self.calls.ice_candidate(handle, receiver_id, candidate),
            ClientEvent::EndCall { receiver_id } => self.calls.end_call(handle, receiver_id),
            ClientEvent::RequestOnlineUsers => {
                let _guard = self.lock_transition();
                let delivered = handle.send(ServerEvent::GetOnlineUsers(self.registry.snapshot()));
                self.metrics.record_send(delivered);
            }
            // Liveness was already recorded by `touch`.
            ClientEvent::Pong { .. } => {}
        }
    }

    /// Typing indicators go to every handle of the receiver. Offline
    /// receivers are skipped silently.
    fn relay_typing(&self, from: UserId, to: UserId, is_typing: bool) {
        let event = ServerEvent::UserTyping {
            user_id: from,
            is_typing,
        };
        self.send_to_user(&to, &event);
    }

    /// Enqueue `event` to every handle of `user_id`. Returns how many
    /// handles accepted it.
    pub fn send_to_user(&self, user_id: &UserId, event: &ServerEvent) -> usize {
        let mut delivered = 0;
        for handle in self.registry.lookup(user_id) {
            let ok = handle.send(event.clone());
            self.metrics.record_send(ok);
            delivered += usize::from(ok);
        }
        delivered
    }

    /// Close and forget every connection (shutdown).
    pub fn close_all(&self) {
        let _guard = self.lock_transition();
        let all = self.registry.drain();
        for handle in &all {
            handle.close();
            self.metrics.connection_closed();
        }
        info!(count = all.len(), "All relay connections closed");
    }
}
