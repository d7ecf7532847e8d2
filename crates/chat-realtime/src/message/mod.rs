//! Relay event types, serialization, and validation.

pub mod serializer;
pub mod types;
pub mod validator;

pub use types::{ClientEvent, ServerEvent};
