//! Conversations, message delivery, and read receipts.

pub mod service;

pub use service::{MarkReadRequest, MarkReadResult, MessageService, SendMessageRequest};
