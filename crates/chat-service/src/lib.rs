//! # chat-service
//!
//! Business logic service layer for the chat relay. Each service
//! orchestrates the store gateway and, where a write must reach live
//! clients, the [`notify::MessageNotifier`] seam implemented by the relay.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod call_log;
pub mod contact;
pub mod context;
pub mod message;
pub mod notify;

pub use call_log::CallLogService;
pub use contact::ContactService;
pub use context::RequestContext;
pub use message::MessageService;
pub use notify::{MessageNotifier, NoopNotifier};
