//! Core logic for Fieldsync.
//!
//! - [`sync`] - Bookmark-based incremental sync protocol
//! - [`chain`] - Order revision chains with stable identity
//! - [`providers`] - Guest provider get-or-create
//! - [`service`] - Facade wiring stores, controllers and the chain resolver
//!
//! # Sync Workflow
//!
//! 1. **Decode**: The controller decodes the client's bookmark (none on first sync)
//! 2. **Scan**: The fetcher reads the clock, then scans the store in `(date_modified, id)` order
//! 3. **Bookmark**: A full page resumes after its last record; a short page resumes at "now"
//! 4. **Clamp**: The bookmark is pulled back by the buffer so late commits are not skipped
//! 5. **Respond**: Results, the encoded bookmark and `more`
//!
//! # Example
//!
//! ```rust,no_run
//! use fieldsync::config::load_config;
//! use fieldsync::core::service::FieldsyncService;
//! use fieldsync::domain::RecordKind;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("fieldsync.toml")?;
//! let service = FieldsyncService::from_config(&config).await?;
//!
//! let mut bookmark: Option<String> = None;
//! loop {
//!     let request = service.default_request(RecordKind::Observations, bookmark.as_deref());
//!     let response = service.sync(RecordKind::Observations, &request).await?;
//!     bookmark = response["bookmark"].as_str().map(str::to_string);
//!     if response["more"] != true {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod providers;
pub mod service;
pub mod sync;
