//! Route handlers organized by domain.

pub mod call_log;
pub mod health;
pub mod message;
pub mod ws;
