//! Infrastructure layer wiring concrete data store adapters.

pub mod storage;

pub use storage::{InMemoryStore, SledStore};
