//! Store abstraction layer
//!
//! Trait-based access to the backing store so the sync protocol and the
//! order chain layer work against PostgreSQL or the in-memory store.

pub mod factory;
pub mod traits;

pub use factory::{create_store, Stores};
pub use traits::{ChangeStore, OrderStore, ProviderStore, StoreAdmin, StoreResult};
