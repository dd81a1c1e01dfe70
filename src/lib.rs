// Fieldsync - Incremental sync and order revision chains for field clients
// Copyright (c) 2025 Fieldsync Contributors
// Licensed under the MIT License

//! # Fieldsync
//!
//! Server-side building blocks for disconnected clinical clients that keep a
//! local replica of patients, observations and orders.
//!
//! ## Overview
//!
//! - **Incremental sync**: clients page through "everything changed since my
//!   last bookmark" per record kind, without missing rows committed late
//! - **Order revision chains**: orders look like mutable records with a
//!   stable id while the store only ever appends or voids revisions
//! - **Guest provider**: orders from unauthenticated clients are attributed
//!   to one shared provider, created on first use
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Sync protocol, revision chains, service facade
//! - [`adapters`] - Store traits, PostgreSQL and in-memory stores
//! - [`domain`] - Records, ids and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fieldsync::config::load_config;
//! use fieldsync::core::service::FieldsyncService;
//! use fieldsync::domain::RecordKind;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("fieldsync.toml")?;
//!     let service = FieldsyncService::from_config(&config).await?;
//!
//!     let request = service.default_request(RecordKind::Patients, None);
//!     let page = service.sync(RecordKind::Patients, &request).await?;
//!     println!("next bookmark: {}", page["bookmark"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Bookmarks
//!
//! A bookmark is an opaque string. It records the position after the last
//! delivered record, held back by a configurable buffer behind the server
//! clock so rows from transactions that commit late are delivered on a later
//! call. Clients must treat delivery as at-least-once and upsert by id.
//!
//! ## Order Chains
//!
//! ```rust,no_run
//! use fieldsync::core::service::FieldsyncService;
//! use serde_json::json;
//!
//! # async fn example(service: &FieldsyncService) -> Result<(), Box<dyn std::error::Error>> {
//! let order = service
//!     .create_order(&json!({"patient_uuid": "p1", "instructions": "Rest"}))
//!     .await?;
//! let revised = service
//!     .update_order(&order.stable_id, &json!({"start_millis": null}), None)
//!     .await?;
//! assert_eq!(revised.stable_id, order.stable_id);
//! service.delete_order(&order.stable_id, "entered in error").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Library calls return [`domain::FieldsyncError`]; the CLI maps errors to
//! exit codes.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
