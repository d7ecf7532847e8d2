//! Call signaling: stateless forwarding of offer/answer/candidate payloads.

pub mod coordinator;

pub use coordinator::CallSignalingCoordinator;
