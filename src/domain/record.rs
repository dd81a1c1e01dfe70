//! Modifiable record abstraction shared by every synced resource type
//!
//! The sync engine treats observations, patients and order revisions as
//! opaque records that only expose an id, a modification time and a voided
//! flag. Everything else is carried through untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The resource types clients can sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Clinical observations
    Observations,
    /// Patient demographics
    Patients,
    /// Order revisions (each revision is synced as its own record)
    Orders,
}

impl RecordKind {
    /// All record kinds, in the order clients usually sync them
    pub const ALL: [RecordKind; 3] = [
        RecordKind::Patients,
        RecordKind::Observations,
        RecordKind::Orders,
    ];

    /// Returns the lowercase name used in config keys, CLI args and table names
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Observations => "observations",
            RecordKind::Patients => "patients",
            RecordKind::Orders => "orders",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "observations" | "obs" => Ok(RecordKind::Observations),
            "patients" => Ok(RecordKind::Patients),
            "orders" => Ok(RecordKind::Orders),
            other => Err(format!(
                "Unknown record kind '{other}'. Must be one of: observations, patients, orders"
            )),
        }
    }
}

/// A record that can be delivered through the incremental sync protocol
///
/// Records are totally ordered by `(date_modified, sync_id)`; the change
/// store must return them in that order.
pub trait SyncRecord: Clone + Send + Sync + 'static {
    /// The resource type this record belongs to
    const KIND: RecordKind;

    /// Stable tiebreak key for records sharing a modification time
    fn sync_id(&self) -> &str;

    /// Last modification time as recorded by the store
    fn date_modified(&self) -> DateTime<Utc>;

    /// Whether the record has been voided (soft-deleted)
    fn is_voided(&self) -> bool;
}
