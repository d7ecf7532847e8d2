//! PostgreSQL implementations of the store traits.

pub mod call_log;
pub mod message;
pub mod user;

pub use call_log::CallLogRepository;
pub use message::MessageRepository;
pub use user::UserRepository;
