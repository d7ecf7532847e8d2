//! # chat-entity
//!
//! Domain entity models for the chat relay. Every struct in this crate is
//! either a database row or a domain value object. Row types derive
//! `sqlx::FromRow` and serialize with camelCase keys, which is the shape
//! clients see on both the HTTP and the relay surface.

pub mod call_log;
pub mod conversation;
pub mod message;
pub mod user;
