//! PostgreSQL store
//!
//! Keyset scans over `(date_modified, id)` with ids compared under the `C`
//! collation so the database orders ids the same way [`Bookmark`] does.
//!
//! [`Bookmark`]: crate::core::sync::Bookmark

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
pub use models::SyncTable;
