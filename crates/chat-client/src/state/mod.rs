//! Client conversation state.
//!
//! Three update sources feed this view: fetch results, optimistic local
//! writes, and relay pushes. Everything here is synchronous and
//! deterministic; [`crate::ChatClient`] owns the timers and transports.

pub mod chat_list;
pub mod conversation;
pub mod pending;
pub mod read_ack;
pub mod typing;

pub use chat_list::{ChatListEntry, MessageRef, Preview};
pub use conversation::{ConversationState, Incoming, MessageView};
pub use pending::{PendingMessage, PendingOverlay, TempId};
pub use read_ack::{ReadAckDebounce, ReadAckTicket};
pub use typing::{LocalTypingEmitter, TypingTracker};
