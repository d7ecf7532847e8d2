//! Core type definitions used across the chat workspace.

pub mod id;

pub use id::*;
