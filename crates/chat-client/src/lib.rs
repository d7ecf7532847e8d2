//! # chat-client
//!
//! The signed-in user's view of the chat relay.
//!
//! ## Modules
//!
//! - `state`: confirmed store plus pending overlay, chat list ordering,
//!   unread and read-receipt reconciliation, typing, online set
//! - `call`: client-side call session state machine and call-log drafts
//! - `transport`: the [`transport::ChatApi`] trait with its `reqwest`
//!   implementation, and the `tokio-tungstenite` relay connection
//! - `client`: [`ChatClient`], which drives state from API results and
//!   relay events

pub mod call;
pub mod client;
pub mod config;
pub mod error;
pub mod state;
pub mod transport;

pub use client::{ChatClient, ClientChannels, ClientNotice};
pub use config::ClientConfig;
pub use error::ClientError;
pub use state::ConversationState;
