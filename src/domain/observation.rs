//! Observation domain model

use super::ids::PatientId;
use super::record::{RecordKind, SyncRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A single clinical observation
///
/// The concept and value are opaque to the sync engine; they are stored and
/// delivered as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Observation UUID
    pub uuid: String,

    /// Patient the observation belongs to
    pub patient_id: PatientId,

    /// When the observation was made
    pub observed_at: DateTime<Utc>,

    /// Concept identifier
    pub concept: String,

    /// Observed value
    pub value: Value,

    /// Last modification time
    pub date_modified: DateTime<Utc>,

    /// Soft-deletion flag
    #[serde(default)]
    pub voided: bool,
}

impl Observation {
    /// Client-facing JSON representation
    pub fn to_json(&self) -> Value {
        let mut json = json!({
            "uuid": self.uuid,
            "patient_uuid": self.patient_id.as_str(),
            "time": self.observed_at.timestamp_millis(),
            "concept_uuid": self.concept,
            "value": self.value,
        });
        if self.voided {
            json["voided"] = json!(true);
        }
        json
    }
}

impl SyncRecord for Observation {
    const KIND: RecordKind = RecordKind::Observations;

    fn sync_id(&self) -> &str {
        &self.uuid
    }

    fn date_modified(&self) -> DateTime<Utc> {
        self.date_modified
    }

    fn is_voided(&self) -> bool {
        self.voided
    }
}
