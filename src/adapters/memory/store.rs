//! In-memory store
//!
//! Keeps every table in a vector behind a `tokio::sync::RwLock`. Scans sort
//! and filter on every call, which is fine for tests and small deployments.

use crate::adapters::store::{ChangeStore, OrderStore, ProviderStore, StoreAdmin, StoreResult};
use crate::core::sync::Bookmark;
use crate::domain::{
    Observation, OrderRevision, Patient, PatientId, Provider, ProviderId, RevisionId, StoreError,
    SyncRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    patients: Vec<Patient>,
    observations: Vec<Observation>,
    orders: Vec<OrderRevision>,
    providers: Vec<Provider>,
}

/// In-memory implementation of every store trait
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a patient
    pub async fn put_patient(&self, patient: Patient) {
        let mut tables = self.tables.write().await;
        tables.patients.retain(|p| p.uuid != patient.uuid);
        tables.patients.push(patient);
    }

    /// Inserts or replaces an observation
    pub async fn put_observation(&self, observation: Observation) {
        let mut tables = self.tables.write().await;
        tables.observations.retain(|o| o.uuid != observation.uuid);
        tables.observations.push(observation);
    }

    /// Replaces an order revision row wholesale
    ///
    /// Bypasses the insert-only rule of [`OrderStore`]; used to stage
    /// histories such as concurrent revisions.
    pub async fn put_revision(&self, revision: OrderRevision) {
        let mut tables = self.tables.write().await;
        tables.orders.retain(|r| r.revision_id != revision.revision_id);
        tables.orders.push(revision);
    }
}

fn scan_rows<R: SyncRecord>(
    rows: &[R],
    after: Option<&Bookmark>,
    limit: usize,
    include_voided: bool,
) -> Vec<R> {
    let mut matching: Vec<&R> = rows
        .iter()
        .filter(|r| include_voided || !r.is_voided())
        .filter(|r| after.map_or(true, |b| b.admits(r.date_modified(), r.sync_id())))
        .collect();
    matching.sort_by(|a, b| {
        a.date_modified()
            .cmp(&b.date_modified())
            .then_with(|| a.sync_id().cmp(b.sync_id()))
    });
    matching.into_iter().take(limit).cloned().collect()
}

#[async_trait]
impl ChangeStore<Patient> for MemoryStore {
    async fn scan(
        &self,
        after: Option<&Bookmark>,
        limit: usize,
        include_voided: bool,
    ) -> StoreResult<Vec<Patient>> {
        let tables = self.tables.read().await;
        Ok(scan_rows(&tables.patients, after, limit, include_voided))
    }
}

#[async_trait]
impl ChangeStore<Observation> for MemoryStore {
    async fn scan(
        &self,
        after: Option<&Bookmark>,
        limit: usize,
        include_voided: bool,
    ) -> StoreResult<Vec<Observation>> {
        let tables = self.tables.read().await;
        Ok(scan_rows(&tables.observations, after, limit, include_voided))
    }
}

#[async_trait]
impl ChangeStore<OrderRevision> for MemoryStore {
    async fn scan(
        &self,
        after: Option<&Bookmark>,
        limit: usize,
        include_voided: bool,
    ) -> StoreResult<Vec<OrderRevision>> {
        let tables = self.tables.read().await;
        Ok(scan_rows(&tables.orders, after, limit, include_voided))
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn patient_exists(&self, patient_id: &PatientId) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.patients.iter().any(|p| &p.uuid == patient_id))
    }

    async fn get_revision(&self, revision_id: &RevisionId) -> StoreResult<Option<OrderRevision>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .find(|r| &r.revision_id == revision_id)
            .cloned())
    }

    async fn revisions_for_patient(
        &self,
        patient_id: &PatientId,
    ) -> StoreResult<Vec<OrderRevision>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .filter(|r| &r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn all_revisions(&self) -> StoreResult<Vec<OrderRevision>> {
        Ok(self.tables.read().await.orders.clone())
    }

    async fn insert_revision(&self, revision: &OrderRevision) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .orders
            .iter()
            .any(|r| r.revision_id == revision.revision_id)
        {
            return Err(StoreError::WriteFailed(format!(
                "order revision {} already exists",
                revision.revision_id
            )));
        }
        tables.orders.push(revision.clone());
        Ok(())
    }

    async fn void_revisions(
        &self,
        revision_ids: &[RevisionId],
        reason: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        for revision in tables
            .orders
            .iter_mut()
            .filter(|r| revision_ids.contains(&r.revision_id))
        {
            revision.voided = true;
            revision.void_reason = Some(reason.to_string());
            revision.date_modified = at;
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderStore for MemoryStore {
    async fn get_provider(&self, provider_id: &ProviderId) -> StoreResult<Option<Provider>> {
        let tables = self.tables.read().await;
        Ok(tables
            .providers
            .iter()
            .find(|p| &p.id == provider_id)
            .cloned())
    }

    async fn insert_provider(&self, provider: &Provider) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.providers.iter().any(|p| p.id == provider.id) {
            return Err(StoreError::WriteFailed(format!(
                "provider {} already exists",
                provider.id
            )));
        }
        tables.providers.push(provider.clone());
        Ok(())
    }

    async fn list_providers(&self) -> StoreResult<Vec<Provider>> {
        Ok(self.tables.read().await.providers.clone())
    }
}

#[async_trait]
impl StoreAdmin for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn test_connection(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        Ok(())
    }
}
