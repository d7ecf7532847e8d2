//! Client and server relay event definitions.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.
//! Payload fields are camelCase. Call payloads (`offer`, `answer`,
//! `candidate`) are opaque to the relay and forwarded untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use chat_core::types::id::{MessageId, UserId};
use chat_entity::message::Message;

/// Events a client may send over its relay connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Typing indicator for one partner.
    #[serde(rename = "typing", rename_all = "camelCase")]
    Typing {
        /// Partner being typed to.
        receiver_id: UserId,
        /// Whether the user is currently typing.
        is_typing: bool,
    },
    /// Start a call with an SDP offer.
    #[serde(rename = "call-user", rename_all = "camelCase")]
    CallUser {
        /// Callee.
        receiver_id: UserId,
        /// Session description offer.
        offer: Value,
    },
    /// Accept an incoming call.
    #[serde(rename = "answer-call", rename_all = "camelCase")]
    AnswerCall {
        /// Caller being answered.
        caller_id: UserId,
        /// Session description answer.
        answer: Value,
    },
    /// Decline an incoming call.
    #[serde(rename = "reject-call", rename_all = "camelCase")]
    RejectCall {
        /// Caller being declined.
        caller_id: UserId,
    },
    /// Forward a network candidate to the peer.
    #[serde(rename = "ice-candidate", rename_all = "camelCase")]
    IceCandidate {
        /// Peer.
        receiver_id: UserId,
        /// Candidate payload. `null` marks end of candidates and is not
        /// forwarded.
        #[serde(default)]
        candidate: Option<Value>,
    },
    /// Hang up.
    #[serde(rename = "end-call", rename_all = "camelCase")]
    EndCall {
        /// Peer.
        receiver_id: UserId,
    },
    /// Ask for the current online set.
    #[serde(rename = "requestOnlineUsers")]
    RequestOnlineUsers,
    /// Heartbeat reply.
    #[serde(rename = "pong")]
    Pong {
        /// Echo of the ping timestamp.
        #[serde(default)]
        timestamp: i64,
    },
}

impl ClientEvent {
    /// Wire name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Typing { .. } => "typing",
            Self::CallUser { .. } => "call-user",
            Self::AnswerCall { .. } => "answer-call",
            Self::RejectCall { .. } => "reject-call",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::EndCall { .. } => "end-call",
            Self::RequestOnlineUsers => "requestOnlineUsers",
            Self::Pong { .. } => "pong",
        }
    }
}

/// Events the relay pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// The full set of online user ids.
    #[serde(rename = "getOnlineUsers")]
    GetOnlineUsers(Vec<UserId>),
    /// A newly persisted message.
    #[serde(rename = "newMessage")]
    NewMessage(Message),
    /// Messages the reader has acknowledged.
    #[serde(rename = "messageRead", rename_all = "camelCase")]
    MessageRead {
        /// Ids that flipped to read.
        message_ids: Vec<MessageId>,
        /// The reader.
        user_id: UserId,
    },
    /// Typing indicator from a partner.
    #[serde(rename = "userTyping", rename_all = "camelCase")]
    UserTyping {
        /// The typist.
        user_id: UserId,
        /// Whether they are typing.
        is_typing: bool,
    },
    /// Someone is calling.
    #[serde(rename = "incoming-call", rename_all = "camelCase")]
    IncomingCall {
        /// Caller.
        caller_id: UserId,
        /// Caller's display name.
        caller_name: String,
        /// Opaque offer.
        offer: Value,
    },
    /// The callee answered.
    #[serde(rename = "call-accepted")]
    CallAccepted {
        /// Opaque answer.
        answer: Value,
    },
    /// The callee declined.
    #[serde(rename = "call-rejected")]
    CallRejected,
    /// A network candidate from the peer.
    #[serde(rename = "ice-candidate")]
    IceCandidate {
        /// Opaque candidate.
        candidate: Value,
    },
    /// The peer hung up.
    #[serde(rename = "call-ended")]
    CallEnded,
    /// A call event could not reach the peer.
    #[serde(rename = "call-failed")]
    CallFailed {
        /// `receiver-offline` or `peer-offline`.
        reason: String,
    },
    /// Heartbeat probe.
    #[serde(rename = "ping")]
    Ping {
        /// Server time in milliseconds since the epoch.
        timestamp: i64,
    },
    /// The last client frame was rejected.
    #[serde(rename = "error")]
    Error {
        /// Machine-readable code.
        code: String,
        /// Human-readable detail.
        message: String,
    },
}

impl ServerEvent {
    /// Wire name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetOnlineUsers(_) => "getOnlineUsers",
            Self::NewMessage(_) => "newMessage",
            Self::MessageRead { .. } => "messageRead",
            Self::UserTyping { .. } => "userTyping",
            Self::IncomingCall { .. } => "incoming-call",
            Self::CallAccepted { .. } => "call-accepted",
            Self::CallRejected => "call-rejected",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::CallEnded => "call-ended",
            Self::CallFailed { .. } => "call-failed",
            Self::Ping { .. } => "ping",
            Self::Error { .. } => "error",
        }
    }
}

/// Reason sent with `call-failed` when `call-user` finds no callee handle.
pub const REASON_RECEIVER_OFFLINE: &str = "receiver-offline";

/// Reason sent with `call-failed` for every other call event whose peer
/// has no handle.
pub const REASON_PEER_OFFLINE: &str = "peer-offline";
