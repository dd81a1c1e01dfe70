//! Storage backends for Fieldsync.
//!
//! - [`store`] - Store traits and the backend factory
//! - [`memory`] - In-process store used by tests and the `memory` target
//! - [`postgresql`] - PostgreSQL store
//!
//! The sync protocol and the order chain layer only see the traits in
//! [`store`]; the factory picks a backend from `store_target`:
//!
//! ```rust,no_run
//! use fieldsync::adapters::store::create_store;
//! use fieldsync::config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("fieldsync.toml")?;
//! let stores = create_store(&config).await?;
//! stores.admin.test_connection().await?;
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod postgresql;
pub mod store;
