//! # chat-api
//!
//! HTTP API layer for the chat relay built on Axum.
//!
//! Provides the message and call-log REST endpoints, the relay WebSocket
//! upgrade, middleware (CORS, logging, compression), extractors, DTOs, and
//! error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use state::AppState;
