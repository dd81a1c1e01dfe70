//! Revision chain resolver
//!
//! Presents each order as a single mutable entity on top of immutable
//! revisions. Clients only ever see the chain's stable id (the id of its
//! first revision) together with the fields of its current revision.
//!
//! Nothing is cached: every call reloads the patient's revisions, so a
//! revision written by another process is visible to the next call.

use super::edit::{NewOrder, OrderEdit, KEY_REVISION};
use super::index::ChainIndex;
use crate::adapters::store::OrderStore;
use crate::core::sync::Clock;
use crate::domain::{
    FieldsyncError, OrderRevision, PatientId, ProviderId, Result, RevisionId, SyncRecord,
};
use crate::log_chain_event;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The current revision of an order together with its stable id
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOrder {
    /// Id of the chain's first revision
    pub stable_id: RevisionId,

    /// The chain's current revision
    pub current: OrderRevision,
}

impl ResolvedOrder {
    /// Client-facing JSON
    ///
    /// Carries the current revision id under `"revision"`, which callers pass
    /// back as the expected revision of a later update. Synced revisions are
    /// rendered without it.
    pub fn to_json(&self) -> Value {
        let mut json = self.current.to_json(&self.stable_id);
        json[KEY_REVISION] = Value::String(self.current.revision_id.to_string());
        json
    }
}

/// Resolves and mutates order revision chains
pub struct ChainResolver {
    store: Arc<dyn OrderStore>,
    clock: Arc<dyn Clock>,
}

impl ChainResolver {
    /// Creates a resolver over `store`
    pub fn new(store: Arc<dyn OrderStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn load_revision(&self, revision_id: &RevisionId) -> Result<OrderRevision> {
        self.store
            .get_revision(revision_id)
            .await?
            .ok_or_else(|| FieldsyncError::NotFound(format!("order {revision_id}")))
    }

    async fn index_for_patient(&self, patient_id: &PatientId) -> Result<ChainIndex> {
        let revisions = self.store.revisions_for_patient(patient_id).await?;
        Ok(ChainIndex::build(revisions))
    }

    /// Returns the stable id of the chain containing `revision_id`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the revision does not exist.
    pub async fn resolve_identity(&self, revision_id: &RevisionId) -> Result<RevisionId> {
        let revision = self.load_revision(revision_id).await?;
        let index = self.index_for_patient(&revision.patient_id).await?;
        Ok(index
            .root_of(revision_id)
            .map(|root| root.revision_id.clone())
            .unwrap_or(revision.revision_id))
    }

    /// Returns the current revision of the chain containing `revision_id`
    ///
    /// Any revision of the chain may be passed, not only the stable id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the revision does not exist or the chain has
    /// been deleted.
    pub async fn resolve_latest(&self, revision_id: &RevisionId) -> Result<ResolvedOrder> {
        let revision = self.load_revision(revision_id).await?;
        let index = self.index_for_patient(&revision.patient_id).await?;
        Self::latest_in(&index, revision_id)
    }

    // Walks forward from the root so every member of a forked chain agrees
    // on one current revision.
    fn latest_in(index: &ChainIndex, revision_id: &RevisionId) -> Result<ResolvedOrder> {
        let not_found = || FieldsyncError::NotFound(format!("order {revision_id}"));
        let root = index.root_of(revision_id).ok_or_else(not_found)?;
        let tail = index.tail_of(&root.revision_id).ok_or_else(not_found)?;
        if tail.voided {
            return Err(not_found());
        }
        Ok(ResolvedOrder {
            stable_id: root.revision_id.clone(),
            current: tail.clone(),
        })
    }

    /// Writes the first revision of a new chain
    ///
    /// The scheduled start defaults to the current time.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown patient and `Validation` if the
    /// requested id is already taken.
    pub async fn create(&self, order: NewOrder, orderer: &ProviderId) -> Result<ResolvedOrder> {
        if !self.store.patient_exists(&order.patient_id).await? {
            return Err(FieldsyncError::NotFound(format!(
                "patient {}",
                order.patient_id
            )));
        }

        let revision_id = match order.uuid {
            Some(requested) => {
                if self.store.get_revision(&requested).await?.is_some() {
                    return Err(FieldsyncError::Validation(format!(
                        "order {requested} already exists"
                    )));
                }
                requested
            }
            None => RevisionId::generate(),
        };

        let now = self.clock.now();
        let root = OrderRevision::builder()
            .revision_id(revision_id)
            .patient_id(order.patient_id)
            .orderer(orderer.clone())
            .instructions(order.instructions)
            .scheduled_start(Some(order.scheduled_start.unwrap_or(now)))
            .auto_expire(order.auto_expire)
            .created_at(now)
            .build()
            .map_err(FieldsyncError::Validation)?;

        self.store.insert_revision(&root).await?;
        log_chain_event!("created", root.revision_id, root.revision_id);

        Ok(ResolvedOrder {
            stable_id: root.revision_id.clone(),
            current: root,
        })
    }

    /// Applies `edits` by appending a new revision to the chain
    ///
    /// Returns the order unchanged when no edit alters a field. When
    /// `expected_current` is given, the update is refused unless it still
    /// names the chain's current revision.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the chain does not exist or was deleted and
    /// `ConcurrentModification` if `expected_current` is stale.
    pub async fn revise(
        &self,
        revision_id: &RevisionId,
        edits: &[OrderEdit],
        expected_current: Option<&RevisionId>,
    ) -> Result<ResolvedOrder> {
        let resolved = self.resolve_latest(revision_id).await?;

        if let Some(expected) = expected_current {
            if expected != &resolved.current.revision_id {
                return Err(FieldsyncError::ConcurrentModification {
                    expected: expected.to_string(),
                    actual: resolved.current.revision_id.to_string(),
                });
            }
        }

        let mut next = resolved
            .current
            .successor(RevisionId::generate(), self.clock.now());
        let mut changed = false;
        for edit in edits {
            changed |= edit.apply(&mut next);
        }

        if !changed {
            tracing::debug!(stable_id = %resolved.stable_id, "Order update changed nothing");
            return Ok(resolved);
        }

        self.store.insert_revision(&next).await?;
        log_chain_event!("revised", resolved.stable_id, next.revision_id);

        Ok(ResolvedOrder {
            stable_id: resolved.stable_id,
            current: next,
        })
    }

    /// Voids every revision of the chain containing `revision_id`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the chain does not exist or was already deleted.
    pub async fn delete(&self, revision_id: &RevisionId, reason: &str) -> Result<RevisionId> {
        let revision = self.load_revision(revision_id).await?;
        let index = self.index_for_patient(&revision.patient_id).await?;
        let resolved = Self::latest_in(&index, revision_id)?;

        let members: Vec<RevisionId> = index
            .members_of(&resolved.stable_id)
            .into_iter()
            .map(|r| r.revision_id.clone())
            .collect();

        self.store
            .void_revisions(&members, reason, self.clock.now())
            .await?;
        log_chain_event!("deleted", resolved.stable_id, resolved.current.revision_id);
        tracing::debug!(revisions = members.len(), reason, "Voided order chain");

        Ok(resolved.stable_id)
    }

    /// Current revision of every live chain, for one patient or for all
    pub async fn latest_versions(
        &self,
        patient_id: Option<&PatientId>,
    ) -> Result<Vec<ResolvedOrder>> {
        let revisions = match patient_id {
            Some(patient_id) => self.store.revisions_for_patient(patient_id).await?,
            None => self.store.all_revisions().await?,
        };
        let index = ChainIndex::build(revisions);

        let mut orders: Vec<ResolvedOrder> = index
            .heads()
            .into_iter()
            .filter(|(_, tail)| !tail.voided)
            .map(|(root, tail)| ResolvedOrder {
                stable_id: root.revision_id.clone(),
                current: tail.clone(),
            })
            .collect();
        orders.sort_by(|a, b| {
            (a.current.date_created, &a.stable_id).cmp(&(b.current.date_created, &b.stable_id))
        });
        Ok(orders)
    }

    /// Renders synced revisions under their chains' stable ids
    ///
    /// Each revision is rendered as itself (not as its chain's current
    /// revision); voided revisions carry `"voided": true`.
    pub async fn render_revisions(&self, revisions: &[OrderRevision]) -> Result<Vec<Value>> {
        let patients: HashSet<&PatientId> = revisions.iter().map(|r| &r.patient_id).collect();
        let mut indexes: HashMap<&PatientId, ChainIndex> = HashMap::new();
        for patient_id in patients {
            indexes.insert(patient_id, self.index_for_patient(patient_id).await?);
        }

        Ok(revisions
            .iter()
            .map(|revision| {
                let stable_id = indexes
                    .get(&revision.patient_id)
                    .and_then(|index| index.root_of(&revision.revision_id))
                    .map(|root| &root.revision_id)
                    .unwrap_or(&revision.revision_id);
                let json = revision.to_json(stable_id);
                tracing::trace!(revision = revision.sync_id(), "Rendered order revision");
                json
            })
            .collect())
    }
}
