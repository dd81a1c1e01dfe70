//! Order revision domain model
//!
//! The backing store keeps orders as immutable revisions. Each revision
//! points back at the revision it replaced; the first revision of a chain
//! has no predecessor and its id is the order's stable id.

use super::ids::{PatientId, ProviderId, RevisionId};
use super::record::{RecordKind, SyncRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One immutable revision of an order
///
/// # Examples
///
/// ```
/// use fieldsync::domain::order::OrderRevisionBuilder;
/// use fieldsync::domain::ids::{PatientId, ProviderId, RevisionId};
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let revision = OrderRevisionBuilder::new()
///     .revision_id(RevisionId::generate())
///     .patient_id(PatientId::new("p-1").unwrap())
///     .orderer(ProviderId::new("fieldsync_provider_guest").unwrap())
///     .instructions("Amoxicillin 500mg, 3x daily")
///     .scheduled_start(Some(now))
///     .created_at(now)
///     .build()
///     .unwrap();
/// assert!(revision.is_root());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRevision {
    /// Unique id of this revision
    pub revision_id: RevisionId,

    /// The revision this one replaced, `None` for the root of a chain
    pub previous_revision: Option<RevisionId>,

    /// Patient the order is for
    pub patient_id: PatientId,

    /// Free-text order instructions
    pub instructions: String,

    /// When the order takes effect
    pub scheduled_start: Option<DateTime<Utc>>,

    /// When the order stops, if ever
    pub auto_expire: Option<DateTime<Utc>>,

    /// Soft-deletion flag
    #[serde(default)]
    pub voided: bool,

    /// Reason recorded when the revision was voided
    #[serde(default)]
    pub void_reason: Option<String>,

    /// Provider that placed the order
    pub orderer: ProviderId,

    /// When this revision was written
    pub date_created: DateTime<Utc>,

    /// Last time this revision row was touched (creation or voiding)
    pub date_modified: DateTime<Utc>,
}

impl OrderRevision {
    /// Creates a new builder for constructing an OrderRevision
    pub fn builder() -> OrderRevisionBuilder {
        OrderRevisionBuilder::default()
    }

    /// Whether this revision starts a chain
    pub fn is_root(&self) -> bool {
        self.previous_revision.is_none()
    }

    /// Client-facing JSON for this revision, published under the chain's stable id
    ///
    /// Times are epoch milliseconds; unset times are omitted.
    pub fn to_json(&self, stable_id: &RevisionId) -> Value {
        let mut json = json!({
            "uuid": stable_id.as_str(),
            "patient_uuid": self.patient_id.as_str(),
            "instructions": self.instructions,
        });
        if let Some(start) = self.scheduled_start {
            json["start_millis"] = json!(start.timestamp_millis());
        }
        if let Some(stop) = self.auto_expire {
            json["stop_millis"] = json!(stop.timestamp_millis());
        }
        if self.voided {
            json["voided"] = json!(true);
        }
        json
    }

    /// Builds the successor revision: same fields, fresh id, linked back to `self`
    ///
    /// The successor is live regardless of whether `self` was voided.
    pub fn successor(&self, revision_id: RevisionId, at: DateTime<Utc>) -> OrderRevision {
        OrderRevision {
            revision_id,
            previous_revision: Some(self.revision_id.clone()),
            patient_id: self.patient_id.clone(),
            instructions: self.instructions.clone(),
            scheduled_start: self.scheduled_start,
            auto_expire: self.auto_expire,
            voided: false,
            void_reason: None,
            orderer: self.orderer.clone(),
            date_created: at,
            date_modified: at,
        }
    }
}

impl SyncRecord for OrderRevision {
    const KIND: RecordKind = RecordKind::Orders;

    fn sync_id(&self) -> &str {
        self.revision_id.as_str()
    }

    fn date_modified(&self) -> DateTime<Utc> {
        self.date_modified
    }

    fn is_voided(&self) -> bool {
        self.voided
    }
}

/// Builder for constructing OrderRevision instances
#[derive(Debug, Default)]
pub struct OrderRevisionBuilder {
    revision_id: Option<RevisionId>,
    previous_revision: Option<RevisionId>,
    patient_id: Option<PatientId>,
    instructions: Option<String>,
    scheduled_start: Option<DateTime<Utc>>,
    auto_expire: Option<DateTime<Utc>>,
    orderer: Option<ProviderId>,
    created_at: Option<DateTime<Utc>>,
}

impl OrderRevisionBuilder {
    /// Creates a new OrderRevisionBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the revision id
    pub fn revision_id(mut self, revision_id: RevisionId) -> Self {
        self.revision_id = Some(revision_id);
        self
    }

    /// Sets the predecessor revision
    pub fn previous_revision(mut self, previous: Option<RevisionId>) -> Self {
        self.previous_revision = previous;
        self
    }

    /// Sets the patient
    pub fn patient_id(mut self, patient_id: PatientId) -> Self {
        self.patient_id = Some(patient_id);
        self
    }

    /// Sets the instructions
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Sets the scheduled start
    pub fn scheduled_start(mut self, start: Option<DateTime<Utc>>) -> Self {
        self.scheduled_start = start;
        self
    }

    /// Sets the auto-expire time
    pub fn auto_expire(mut self, expire: Option<DateTime<Utc>>) -> Self {
        self.auto_expire = expire;
        self
    }

    /// Sets the ordering provider
    pub fn orderer(mut self, orderer: ProviderId) -> Self {
        self.orderer = Some(orderer);
        self
    }

    /// Sets both creation and modification time
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Builds the OrderRevision
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing or the instructions are blank
    pub fn build(self) -> Result<OrderRevision, String> {
        let instructions = self.instructions.ok_or("instructions are required")?;
        if instructions.trim().is_empty() {
            return Err("instructions cannot be empty".to_string());
        }
        let created_at = self.created_at.ok_or("created_at is required")?;

        Ok(OrderRevision {
            revision_id: self.revision_id.ok_or("revision_id is required")?,
            previous_revision: self.previous_revision,
            patient_id: self.patient_id.ok_or("patient_id is required")?,
            instructions,
            scheduled_start: self.scheduled_start,
            auto_expire: self.auto_expire,
            voided: false,
            void_reason: None,
            orderer: self.orderer.ok_or("orderer is required")?,
            date_created: created_at,
            date_modified: created_at,
        })
    }
}
