//! Client-side call session.

pub mod session;

pub use session::{CallPhase, CallRole, CallSession};
