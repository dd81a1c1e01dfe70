//! Patient domain model
//!
//! Patients are synced as opaque records: demographics live in `content`
//! and are passed through to clients unchanged.

use super::ids::PatientId;
use super::record::{RecordKind, SyncRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A patient record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    /// Patient UUID
    pub uuid: PatientId,

    /// Demographics and identifiers as stored
    pub content: Value,

    /// Creation time
    pub date_created: DateTime<Utc>,

    /// Last modification time
    pub date_modified: DateTime<Utc>,

    /// Soft-deletion flag
    #[serde(default)]
    pub voided: bool,
}

impl Patient {
    /// Creates a new live patient whose creation and modification times are `at`
    pub fn new(uuid: PatientId, content: Value, at: DateTime<Utc>) -> Self {
        Self {
            uuid,
            content,
            date_created: at,
            date_modified: at,
            voided: false,
        }
    }

    /// Client-facing JSON: the stored content plus `uuid` (and `voided` when set)
    pub fn to_json(&self) -> Value {
        let mut json = match &self.content {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("content".to_string(), other.clone());
                map
            }
        };
        json.insert("uuid".to_string(), json!(self.uuid.as_str()));
        if self.voided {
            json.insert("voided".to_string(), json!(true));
        }
        Value::Object(json)
    }
}

impl SyncRecord for Patient {
    const KIND: RecordKind = RecordKind::Patients;

    fn sync_id(&self) -> &str {
        self.uuid.as_str()
    }

    fn date_modified(&self) -> DateTime<Utc> {
        self.date_modified
    }

    fn is_voided(&self) -> bool {
        self.voided
    }
}
