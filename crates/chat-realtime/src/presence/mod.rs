//! Presence registry: which users hold live connections.

pub mod registry;

pub use registry::{PresenceRegistry, Registration, Unregistration};
