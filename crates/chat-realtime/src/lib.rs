//! # chat-realtime
//!
//! WebSocket relay engine for the chat backend. Provides:
//!
//! - Relay connection handles with bounded outbound queues
//! - Presence registry (user id to live connections)
//! - Event relay: online-set broadcasts, typing, message pushes
//! - Stateless call signaling between peers
//! - Application-level heartbeat

pub mod call;
pub mod connection;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod relay;
pub mod server;

pub use connection::authenticator::{AuthenticatedConnection, WsAuthenticator};
pub use connection::handle::ConnectionHandle;
pub use presence::registry::PresenceRegistry;
pub use relay::{Disposition, EventRelay};
pub use server::RealtimeEngine;
