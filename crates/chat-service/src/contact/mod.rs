//! Contact directory.

pub mod service;

pub use service::ContactService;
