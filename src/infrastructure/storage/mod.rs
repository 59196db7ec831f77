//! Storage adapters for the course registry.
//!
//! `SledStore` is the embedded durable store; `InMemoryStore` keeps
//! everything in process memory for tests and short-lived callers.

pub mod memory_store;
pub mod sled_store;

pub use memory_store::InMemoryStore;
pub use sled_store::SledStore;
