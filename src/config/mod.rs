//! Configuration management for Fieldsync.
//!
//! TOML configuration with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `FIELDSYNC_*` environment overrides
//! - Defaults for every optional setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fieldsync::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("fieldsync.toml")?;
//!
//! println!("Buffer: {} ms", config.sync.buffer_millis);
//! println!("Store: {:?}", config.store_target);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`SyncConfig`] - Bookmark buffer, page sizes, voided delivery
//! - [`StoreTarget`] - `postgresql` or `memory`
//! - [`PostgreSQLConfig`] - Connection pool and timeouts
//! - [`MemoryConfig`] - Fixtures for the in-memory store
//! - [`LoggingConfig`] - Local JSON file logging
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//! store_target = "postgresql"
//!
//! [application]
//! log_level = "info"
//!
//! [sync]
//! buffer_millis = 30000
//! observations_page_size = 100
//!
//! [postgresql]
//! connection_string = "${FIELDSYNC_DATABASE_URL}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, Environment, FieldsyncConfig, LoggingConfig, MemoryConfig,
    PostgreSQLConfig, StoreTarget, SyncConfig,
};
pub use secret::{redact_url_password, secret_string, SecretString, SecretValue};
