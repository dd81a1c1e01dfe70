//! In-memory backend

pub mod fixtures;
pub mod store;

pub use fixtures::Fixtures;
pub use store::MemoryStore;
