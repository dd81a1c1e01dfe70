//! Seed data for the in-memory store
//!
//! The in-memory store starts empty on every run. A fixtures file gives it
//! patients and observations to sync and to attach orders to. The file is
//! a JSON document with optional `patients` and `observations` arrays, each
//! entry in the shape the record serializes to.

use super::store::MemoryStore;
use crate::domain::{FieldsyncError, Observation, Patient, Result};
use serde::Deserialize;
use std::path::Path;

/// Records loaded from a fixtures file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixtures {
    /// Patients to insert
    #[serde(default)]
    pub patients: Vec<Patient>,

    /// Observations to insert
    #[serde(default)]
    pub observations: Vec<Observation>,
}

impl Fixtures {
    /// Reads and parses a fixtures file
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the file cannot be read or is not
    /// a valid fixtures document.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            FieldsyncError::Configuration(format!(
                "Failed to read fixtures file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            FieldsyncError::Configuration(format!(
                "Failed to parse fixtures file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Inserts every record into `store`, returning how many were written
    pub async fn seed(self, store: &MemoryStore) -> usize {
        let count = self.patients.len() + self.observations.len();
        for patient in self.patients {
            store.put_patient(patient).await;
        }
        for observation in self.observations {
            store.put_observation(observation).await;
        }
        count
    }
}
