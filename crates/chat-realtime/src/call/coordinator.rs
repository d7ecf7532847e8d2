//! Call signaling coordinator.
//!
//! Holds no call state. Each inbound call event is forwarded to every
//! handle of the counterpart; when the counterpart has none, the
//! originating connection gets exactly one `call-failed`.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use chat_core::types::id::UserId;

use crate::connection::handle::ConnectionHandle;
use crate::message::types::{REASON_PEER_OFFLINE, REASON_RECEIVER_OFFLINE, ServerEvent};
use crate::metrics::RealtimeMetrics;
use crate::presence::registry::PresenceRegistry;

/// Routes call signaling events between peers.
#[derive(Debug, Clone)]
pub struct CallSignalingCoordinator {
    registry: Arc<PresenceRegistry>,
    metrics: Arc<RealtimeMetrics>,
}

impl CallSignalingCoordinator {
    /// Creates a coordinator over `registry`.
    pub fn new(registry: Arc<PresenceRegistry>, metrics: Arc<RealtimeMetrics>) -> Self {
        Self { registry, metrics }
    }

    /// `call-user` -> `incoming-call` carrying the caller's id and name.
    pub fn call_user(&self, from: &ConnectionHandle, receiver_id: UserId, offer: Value) {
        let event = ServerEvent::IncomingCall {
            caller_id: from.user_id,
            caller_name: from.display_name.clone(),
            offer,
        };
        self.forward(from, receiver_id, event, REASON_RECEIVER_OFFLINE);
    }

    /// `answer-call` -> `call-accepted` to the caller.
    pub fn answer_call(&self, from: &ConnectionHandle, caller_id: UserId, answer: Value) {
        self.forward(
            from,
            caller_id,
            ServerEvent::CallAccepted { answer },
            REASON_PEER_OFFLINE,
        );
    }

    /// `reject-call` -> `call-rejected` to the caller.
    pub fn reject_call(&self, from: &ConnectionHandle, caller_id: UserId) {
        self.forward(from, caller_id, ServerEvent::CallRejected, REASON_PEER_OFFLINE);
    }

    /// `ice-candidate` -> `ice-candidate` to the peer. A missing or null
    /// candidate is ignored.
    pub fn ice_candidate(
        &self,
        from: &ConnectionHandle,
        receiver_id: UserId,
        candidate: Option<Value>,
    ) {
        let Some(candidate) = candidate.filter(|c| !c.is_null()) else {
            debug!(conn_id = %from.id, "Ignoring empty ICE candidate");
            return;
        };
        self.forward(
            from,
            receiver_id,
            ServerEvent::IceCandidate { candidate },
            REASON_PEER_OFFLINE,
        );
    }

    /// `end-call` -> `call-ended` to the peer.
    pub fn end_call(&self, from: &ConnectionHandle, receiver_id: UserId) {
        self.forward(from, receiver_id, ServerEvent::CallEnded, REASON_PEER_OFFLINE);
    }

    fn forward(&self, from: &ConnectionHandle, to: UserId, event: ServerEvent, miss: &str) {
        let targets = self.registry.lookup(&to);
        if targets.is_empty() {
            debug!(
                conn_id = %from.id,
                from = %from.user_id,
                to = %to,
                event = event.name(),
                "Call peer offline"
            );
            self.metrics.call_failed();
            let delivered = from.send(ServerEvent::CallFailed {
                reason: miss.to_string(),
            });
            self.metrics.record_send(delivered);
            return;
        }

        debug!(
            from = %from.user_id,
            to = %to,
            event = event.name(),
            handles = targets.len(),
            "Relaying call event"
        );
        for target in &targets {
            self.metrics.record_send(target.send(event.clone()));
        }
    }
}
