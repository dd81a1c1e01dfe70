//! Store abstraction traits
//!
//! Backends implement these traits to serve the sync protocol and the order
//! chain layer. Errors are reported as [`StoreError`] so callers can tell a
//! failed scan apart from a failed write.

use crate::core::sync::Bookmark;
use crate::domain::{
    OrderRevision, PatientId, Provider, ProviderId, RevisionId, StoreError, SyncRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Range scans over one record kind in modification order
#[async_trait]
pub trait ChangeStore<R: SyncRecord>: Send + Sync {
    /// Returns up to `limit` records after `after`, ordered by `(date_modified, id)`
    ///
    /// With no bookmark the scan starts at the beginning of history. A
    /// bookmark without a tiebreak admits every record at its timestamp;
    /// with a tiebreak only records at that timestamp with a greater id are
    /// admitted (see [`Bookmark::admits`]). Voided records are skipped
    /// unless `include_voided` is set.
    async fn scan(
        &self,
        after: Option<&Bookmark>,
        limit: usize,
        include_voided: bool,
    ) -> StoreResult<Vec<R>>;
}

/// Access to order revisions for chain resolution and mutation
///
/// Revisions are only ever inserted or voided; no other field changes after
/// insertion.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Whether a patient with this id exists
    async fn patient_exists(&self, patient_id: &PatientId) -> StoreResult<bool>;

    /// Loads a single revision
    async fn get_revision(&self, revision_id: &RevisionId) -> StoreResult<Option<OrderRevision>>;

    /// Loads every revision (voided included) belonging to a patient
    async fn revisions_for_patient(&self, patient_id: &PatientId)
        -> StoreResult<Vec<OrderRevision>>;

    /// Loads every revision in the store (voided included)
    async fn all_revisions(&self) -> StoreResult<Vec<OrderRevision>>;

    /// Persists a brand-new revision
    ///
    /// Fails with `WriteFailed` if the revision id is already taken.
    async fn insert_revision(&self, revision: &OrderRevision) -> StoreResult<()>;

    /// Marks revisions voided with `reason`, touching their modification time
    async fn void_revisions(
        &self,
        revision_ids: &[RevisionId],
        reason: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;
}

/// Provider lookups and creation
#[async_trait]
pub trait ProviderStore: Send + Sync {
    /// Loads a provider by id
    async fn get_provider(&self, provider_id: &ProviderId) -> StoreResult<Option<Provider>>;

    /// Persists a new provider
    async fn insert_provider(&self, provider: &Provider) -> StoreResult<()>;

    /// Lists every provider
    async fn list_providers(&self) -> StoreResult<Vec<Provider>>;
}

/// Connection-level operations
#[async_trait]
pub trait StoreAdmin: Send + Sync {
    /// Short backend name for logs and CLI output
    fn backend_name(&self) -> &'static str;

    /// Checks the store is reachable
    async fn test_connection(&self) -> StoreResult<()>;

    /// Creates tables and indexes if missing
    async fn ensure_schema(&self) -> StoreResult<()>;
}
