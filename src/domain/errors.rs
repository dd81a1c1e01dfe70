//! Domain error types
//!
//! This module defines the error hierarchy for Fieldsync.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Fieldsync error type
///
/// This is the primary error type used throughout the library. Sync and
/// revision-chain operations never retry on their own; every variant is
/// surfaced to the caller, which owns the retry policy.
#[derive(Debug, Error)]
pub enum FieldsyncError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The client supplied a bookmark that cannot be decoded
    #[error("Malformed bookmark: {0}")]
    MalformedBookmark(String),

    /// The backing store failed while scanning for changes
    ///
    /// Retrying the same page with the same bookmark is safe.
    #[error("Sync fetch failed: {0}")]
    SyncFetch(#[source] StoreError),

    /// A stable id or record has no live (non-voided) counterpart
    #[error("Not found: {0}")]
    NotFound(String),

    /// A single field of an order edit was rejected
    #[error(transparent)]
    InvalidEdit(#[from] InvalidEdit),

    /// The chain's current revision moved since the caller last read it
    #[error("Concurrent modification: expected current revision {expected}, found {actual}")]
    ConcurrentModification { expected: String, actual: String },

    /// Validation errors on client input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backing store errors outside of a sync scan
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl FieldsyncError {
    /// Whether the error was caused by the client's input rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FieldsyncError::MalformedBookmark(_)
                | FieldsyncError::NotFound(_)
                | FieldsyncError::InvalidEdit(_)
                | FieldsyncError::ConcurrentModification { .. }
                | FieldsyncError::Validation(_)
        )
    }
}

/// Backing store errors
///
/// Errors that occur when talking to the record store.
/// These errors don't expose the driver's own types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to connect to the store
    #[error("Failed to connect to store: {0}")]
    ConnectionFailed(String),

    /// A read query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A write (insert, update, void) failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// A stored row could not be mapped onto a domain record
    #[error("Failed to deserialize row: {0}")]
    DeserializationFailed(String),

    /// Schema setup failed
    #[error("Schema migration failed: {0}")]
    MigrationFailed(String),

    /// Timeout
    #[error("Store timeout: {0}")]
    Timeout(String),
}

/// A rejected field inside an order update
///
/// Rejections do not abort the update: the remaining fields are still
/// applied and the rejection is logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid edit for '{field}': {reason}")]
pub struct InvalidEdit {
    /// JSON key of the rejected field
    pub field: String,

    /// Why the value was rejected
    pub reason: String,
}

impl InvalidEdit {
    /// Creates a new invalid edit
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for FieldsyncError {
    fn from(err: std::io::Error) -> Self {
        FieldsyncError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for FieldsyncError {
    fn from(err: serde_json::Error) -> Self {
        FieldsyncError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for FieldsyncError {
    fn from(err: toml::de::Error) -> Self {
        FieldsyncError::Configuration(format!("TOML parse error: {err}"))
    }
}
