//! # chat-database
//!
//! The message store gateway: store traits, their PostgreSQL
//! implementations, an in-memory implementation, and connection/migration
//! management.

pub mod connection;
pub mod gateway;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use gateway::Stores;
pub use memory::MemoryStore;
pub use store::{CallLogStore, MessageStore, UserStore};
