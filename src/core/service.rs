//! Service facade
//!
//! Wires the stores, the clock, one sync controller per record kind and the
//! chain resolver together. The CLI and embedding applications talk to this
//! type rather than to the individual components.

use crate::adapters::store::{create_store, ChangeStore, Stores};
use crate::config::schema::{FieldsyncConfig, SyncConfig, MAX_PAGE_SIZE};
use crate::core::chain::{parse_edits, ChainResolver, NewOrder, ResolvedOrder};
use crate::core::providers::ensure_guest_provider;
use crate::core::sync::{
    Clock, SyncController, SyncPageFetcher, SyncRequest, SyncResponse, SystemClock,
};
use crate::domain::{
    FieldsyncError, Observation, OrderRevision, Patient, PatientId, Provider, RecordKind, Result,
    RevisionId, SyncRecord,
};
use serde_json::Value;
use std::sync::Arc;

/// Entry point for sync and order operations
pub struct FieldsyncService {
    stores: Stores,
    clock: Arc<dyn Clock>,
    patients: SyncController<Patient>,
    observations: SyncController<Observation>,
    orders: SyncController<OrderRevision>,
    resolver: ChainResolver,
}

fn controller<R: SyncRecord>(
    store: Arc<dyn ChangeStore<R>>,
    clock: Arc<dyn Clock>,
    sync: &SyncConfig,
) -> SyncController<R> {
    let fetcher = SyncPageFetcher::new(store, clock).with_buffer_millis(sync.buffer_millis);
    SyncController::new(fetcher)
        .with_page_size(sync.page_size_for(R::KIND))
        .with_include_voided(sync.include_voided)
}

impl FieldsyncService {
    /// Builds the service over already-created stores
    pub fn new(stores: Stores, sync: &SyncConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            patients: controller(stores.patients.clone(), clock.clone(), sync),
            observations: controller(stores.observations.clone(), clock.clone(), sync),
            orders: controller(stores.order_changes.clone(), clock.clone(), sync),
            resolver: ChainResolver::new(stores.orders.clone(), clock.clone()),
            stores,
            clock,
        }
    }

    /// Creates the configured store, applies its schema and builds the service
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be created or its schema cannot
    /// be applied.
    pub async fn from_config(config: &FieldsyncConfig) -> Result<Self> {
        let stores = create_store(config).await?;
        stores.admin.ensure_schema().await?;

        tracing::info!(
            backend = stores.admin.backend_name(),
            buffer_millis = config.sync.buffer_millis,
            "Fieldsync service ready"
        );
        Ok(Self::new(stores, &config.sync, Arc::new(SystemClock)))
    }

    /// The stores backing this service
    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// A request carrying the configured defaults for `kind`
    pub fn default_request(&self, kind: RecordKind, bookmark: Option<&str>) -> SyncRequest {
        match kind {
            RecordKind::Patients => self.patients.default_request(bookmark),
            RecordKind::Observations => self.observations.default_request(bookmark),
            RecordKind::Orders => self.orders.default_request(bookmark),
        }
    }

    /// Runs one sync call and renders the response as JSON
    ///
    /// Order revisions are rendered under their chain's stable id.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a page size above the allowed maximum,
    /// `MalformedBookmark` for an undecodable bookmark and `SyncFetch` when
    /// the store scan fails.
    pub async fn sync(&self, kind: RecordKind, request: &SyncRequest) -> Result<Value> {
        if request.max_results > MAX_PAGE_SIZE {
            return Err(FieldsyncError::Validation(format!(
                "max_results must be at most {MAX_PAGE_SIZE}, got {}",
                request.max_results
            )));
        }

        match kind {
            RecordKind::Patients => {
                let response = self.patients.sync(request).await?;
                Ok(response.to_json(Patient::to_json))
            }
            RecordKind::Observations => {
                let response = self.observations.sync(request).await?;
                Ok(response.to_json(Observation::to_json))
            }
            RecordKind::Orders => {
                let response = self.orders.sync(request).await?;
                let rendered = SyncResponse {
                    results: self.resolver.render_revisions(&response.results).await?,
                    bookmark: response.bookmark,
                    more: response.more,
                };
                Ok(rendered.to_json(Value::clone))
            }
        }
    }

    /// Creates an order from a client JSON body, attributed to the guest provider
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed body, `NotFound` for an unknown
    /// patient, and store errors unchanged.
    pub async fn create_order(&self, body: &Value) -> Result<ResolvedOrder> {
        let order = NewOrder::from_json(body)?;
        let orderer = self.guest_provider().await?;
        self.resolver.create(order, &orderer.id).await
    }

    /// Applies a partial update to the order containing `revision_id`
    ///
    /// Rejected fields are logged and skipped; the valid fields still apply.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist or was deleted and
    /// `ConcurrentModification` if `expected_current` is stale.
    pub async fn update_order(
        &self,
        revision_id: &RevisionId,
        body: &Value,
        expected_current: Option<&RevisionId>,
    ) -> Result<ResolvedOrder> {
        let parsed = parse_edits(body)?;
        for rejected in &parsed.rejected {
            tracing::warn!(
                order = %revision_id,
                field = %rejected.field,
                reason = %rejected.reason,
                "Ignoring invalid order edit"
            );
        }
        self.resolver
            .revise(revision_id, &parsed.edits, expected_current)
            .await
    }

    /// Deletes the order containing `revision_id`, returning its stable id
    pub async fn delete_order(&self, revision_id: &RevisionId, reason: &str) -> Result<RevisionId> {
        self.resolver.delete(revision_id, reason).await
    }

    /// The current version of the order containing `revision_id`
    pub async fn get_order(&self, revision_id: &RevisionId) -> Result<ResolvedOrder> {
        self.resolver.resolve_latest(revision_id).await
    }

    /// Current versions of every live order, optionally for one patient
    pub async fn list_orders(&self, patient_id: Option<&PatientId>) -> Result<Vec<ResolvedOrder>> {
        self.resolver.latest_versions(patient_id).await
    }

    /// The shared guest provider, created on first use
    pub async fn guest_provider(&self) -> Result<Provider> {
        ensure_guest_provider(self.stores.providers.as_ref(), self.clock.as_ref()).await
    }

    /// Every known provider
    pub async fn list_providers(&self) -> Result<Vec<Provider>> {
        Ok(self.stores.providers.list_providers().await?)
    }
}
