//! Call session state machine.
//!
//! The relay only forwards signaling; this session decides which events
//! are legal from which phase and what to write to the call log when the
//! session ends.

use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use chat_core::types::id::UserId;
use chat_entity::call_log::CallOutcome;
use chat_realtime::message::ClientEvent;
use chat_service::call_log::RecordCallLogRequest;

use crate::error::ClientError;

/// Where a call stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallPhase {
    /// No call.
    #[default]
    Idle,
    /// Offer sent or received, waiting for the callee.
    Ringing,
    /// Answer exchanged, media negotiating.
    Connecting,
    /// Media flowing.
    Connected,
    /// The callee declined. Settles into `Ended` once the decline has been
    /// handled.
    Rejected,
    /// Hung up, failed, declined, or the peer left.
    Ended,
}

impl CallPhase {
    /// Whether a new call may start from this phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Idle | Self::Rejected | Self::Ended)
    }
}

/// Which side of the call this client is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallRole {
    /// Placed the call.
    Caller,
    /// Was called.
    Callee,
}

/// One call at a time.
#[derive(Debug, Clone, Default)]
pub struct CallSession {
    phase: CallPhase,
    role: Option<CallRole>,
    peer: Option<UserId>,
    peer_name: Option<String>,
    remote_offer: Option<Value>,
    remote_answer: Option<Value>,
    connected_at: Option<Instant>,
    ended_at: Option<Instant>,
    failure: Option<String>,
    declined: bool,
}

impl CallSession {
    /// An idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    /// This client's role in the current or last call.
    pub fn role(&self) -> Option<CallRole> {
        self.role
    }

    /// The other participant.
    pub fn peer(&self) -> Option<UserId> {
        self.peer
    }

    /// Caller's display name on an incoming call.
    pub fn peer_name(&self) -> Option<&str> {
        self.peer_name.as_deref()
    }

    /// Offer received with an incoming call.
    pub fn remote_offer(&self) -> Option<&Value> {
        self.remote_offer.as_ref()
    }

    /// Answer received from the callee.
    pub fn remote_answer(&self) -> Option<&Value> {
        self.remote_answer.as_ref()
    }

    /// Whether the callee turned the call down.
    pub fn was_declined(&self) -> bool {
        self.declined
    }

    /// Reason reported by `call-failed`, if that is how the call ended.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Place a call.
    pub fn start_outgoing(&mut self, peer: UserId, offer: Value) -> Result<ClientEvent, ClientError> {
        self.require(self.phase.is_terminal(), "place a call")?;
        *self = Self {
            phase: CallPhase::Ringing,
            role: Some(CallRole::Caller),
            peer: Some(peer),
            ..Self::default()
        };
        debug!(peer = %peer, "Placing call");
        Ok(ClientEvent::CallUser {
            receiver_id: peer,
            offer,
        })
    }

    /// An `incoming-call` arrived.
    pub fn on_incoming(
        &mut self,
        caller: UserId,
        caller_name: String,
        offer: Value,
    ) -> Result<(), ClientError> {
        self.require(self.phase.is_terminal(), "receive a call")?;
        *self = Self {
            phase: CallPhase::Ringing,
            role: Some(CallRole::Callee),
            peer: Some(caller),
            peer_name: Some(caller_name),
            remote_offer: Some(offer),
            ..Self::default()
        };
        debug!(caller = %caller, "Incoming call");
        Ok(())
    }

    /// Accept the ringing incoming call.
    pub fn accept(&mut self, answer: Value) -> Result<ClientEvent, ClientError> {
        let caller = self.ringing_peer(CallRole::Callee, "accept")?;
        self.phase = CallPhase::Connecting;
        Ok(ClientEvent::AnswerCall {
            caller_id: caller,
            answer,
        })
    }

    /// Decline the ringing incoming call.
    pub fn reject(&mut self) -> Result<ClientEvent, ClientError> {
        let caller = self.ringing_peer(CallRole::Callee, "reject")?;
        self.declined = true;
        self.finish(CallPhase::Rejected);
        Ok(ClientEvent::RejectCall { caller_id: caller })
    }

    /// The callee answered.
    pub fn on_accepted(&mut self, answer: Value) -> Result<(), ClientError> {
        self.ringing_peer(CallRole::Caller, "handle call-accepted")?;
        self.remote_answer = Some(answer);
        self.phase = CallPhase::Connecting;
        Ok(())
    }

    /// The callee declined.
    pub fn on_rejected(&mut self) -> Result<(), ClientError> {
        self.ringing_peer(CallRole::Caller, "handle call-rejected")?;
        self.declined = true;
        self.finish(CallPhase::Rejected);
        Ok(())
    }

    /// Media negotiation finished.
    pub fn media_connected(&mut self) -> Result<(), ClientError> {
        self.require(self.phase == CallPhase::Connecting, "connect media")?;
        self.phase = CallPhase::Connected;
        self.connected_at = Some(Instant::now());
        Ok(())
    }

    /// Forward a local network candidate to the peer.
    pub fn ice_candidate(&self, candidate: Value) -> Result<ClientEvent, ClientError> {
        let peer = self.active_peer("send a candidate")?;
        Ok(ClientEvent::IceCandidate {
            receiver_id: peer,
            candidate: Some(candidate),
        })
    }

    /// Hang up (or cancel a ringing outgoing call).
    pub fn hang_up(&mut self) -> Result<ClientEvent, ClientError> {
        let peer = self.active_peer("hang up")?;
        self.finish(CallPhase::Ended);
        Ok(ClientEvent::EndCall { receiver_id: peer })
    }

    /// The peer hung up.
    pub fn on_ended(&mut self) -> Result<(), ClientError> {
        self.active_peer("handle call-ended")?;
        self.finish(CallPhase::Ended);
        Ok(())
    }

    /// The relay could not reach the peer.
    pub fn on_failed(&mut self, reason: impl Into<String>) -> Result<(), ClientError> {
        self.active_peer("handle call-failed")?;
        self.failure = Some(reason.into());
        self.finish(CallPhase::Ended);
        Ok(())
    }

    /// Move a declined call from `Rejected` to `Ended`. No-op in any other
    /// phase.
    pub fn settle(&mut self) {
        if self.phase == CallPhase::Rejected {
            self.phase = CallPhase::Ended;
        }
    }

    /// Back to idle, forgetting the last call.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The call log the caller should record for a finished call. `None`
    /// for the callee or while the call is still live.
    pub fn log_draft(&self) -> Option<RecordCallLogRequest> {
        if self.role != Some(CallRole::Caller) {
            return None;
        }
        let receiver_id = self.peer?;
        let (outcome, duration_seconds) = match (self.phase, self.connected_at) {
            (CallPhase::Rejected | CallPhase::Ended, _) if self.declined => {
                (CallOutcome::Declined, 0)
            }
            (CallPhase::Ended, Some(start)) => {
                let end = self.ended_at.unwrap_or(start);
                let secs = end.saturating_duration_since(start).as_secs();
                (CallOutcome::Completed, i64::try_from(secs).unwrap_or(i64::MAX))
            }
            (CallPhase::Ended, None) => (CallOutcome::Missed, 0),
            _ => return None,
        };
        Some(RecordCallLogRequest {
            receiver_id,
            duration_seconds,
            outcome,
        })
    }

    fn finish(&mut self, phase: CallPhase) {
        self.phase = phase;
        self.ended_at = Some(Instant::now());
    }

    fn require(&self, ok: bool, action: &'static str) -> Result<(), ClientError> {
        if ok {
            Ok(())
        } else {
            Err(ClientError::InvalidCallTransition {
                from: self.phase,
                action,
            })
        }
    }

    fn ringing_peer(&self, role: CallRole, action: &'static str) -> Result<UserId, ClientError> {
        match self.peer {
            Some(peer) if self.phase == CallPhase::Ringing && self.role == Some(role) => Ok(peer),
            _ => Err(ClientError::InvalidCallTransition {
                from: self.phase,
                action,
            }),
        }
    }

    fn active_peer(&self, action: &'static str) -> Result<UserId, ClientError> {
        match self.peer {
            Some(peer) if !self.phase.is_terminal() => Ok(peer),
            _ => Err(ClientError::InvalidCallTransition {
                from: self.phase,
                action,
            }),
        }
    }
}
