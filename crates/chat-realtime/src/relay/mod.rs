//! Event relay: connection lifecycle, presence broadcasts, and routing of
//! client events.

pub mod event_relay;
pub mod notifier;

pub use event_relay::{Disposition, EventRelay};
