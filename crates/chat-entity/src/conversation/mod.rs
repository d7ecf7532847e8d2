//! Conversation summaries.

pub mod partner;

pub use partner::ChatPartner;
