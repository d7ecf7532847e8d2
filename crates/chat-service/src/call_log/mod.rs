//! Call history.

pub mod service;

pub use service::{CallLogService, CallLogView, RecordCallLogRequest};
