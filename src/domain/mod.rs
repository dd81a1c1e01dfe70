//! Domain models and types for Fieldsync.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`PatientId`], [`RevisionId`], [`ProviderId`])
//! - **Synced records** ([`Patient`], [`Observation`], [`OrderRevision`]), all
//!   implementing [`SyncRecord`]
//! - **Error types** ([`FieldsyncError`], [`StoreError`], [`InvalidEdit`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Identifiers are newtypes so a patient id cannot be passed where an order
//! revision id is expected:
//!
//! ```rust
//! use fieldsync::domain::{PatientId, RevisionId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let patient_id = PatientId::new("patient-123")?;
//! let revision_id = RevisionId::new("revision-456")?;
//!
//! // let wrong: PatientId = revision_id;  // Compile error!
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod observation;
pub mod order;
pub mod patient;
pub mod provider;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{FieldsyncError, InvalidEdit, StoreError};
pub use ids::{PatientId, ProviderId, RevisionId};
pub use observation::Observation;
pub use order::{OrderRevision, OrderRevisionBuilder};
pub use patient::Patient;
pub use provider::{Provider, GUEST_PROVIDER_ID, GUEST_PROVIDER_NAME};
pub use record::{RecordKind, SyncRecord};
pub use result::Result;
