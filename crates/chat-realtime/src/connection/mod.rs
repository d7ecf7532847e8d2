//! Relay connection lifecycle: handles, phases, heartbeat, handshake auth.

pub mod authenticator;
pub mod handle;
pub mod heartbeat;
pub mod phase;

pub use handle::ConnectionHandle;
pub use phase::ConnectionPhase;
