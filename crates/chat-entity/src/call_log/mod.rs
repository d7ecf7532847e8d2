//! Call log entities.

pub mod model;
pub mod outcome;

pub use model::{CallLog, CallLogEntry, NewCallLog};
pub use outcome::{CallDirection, CallOutcome};
