//! In-process store used by the `memory` provider and by tests.

pub mod store;

pub use store::MemoryStore;
