//! Row mapping for the PostgreSQL store
//!
//! Column lists and row-to-domain conversions for each table. Column order
//! in the `*_COLUMNS` constants is what the `SELECT`s in the adapter return.

use crate::adapters::store::StoreResult;
use crate::domain::{
    Observation, OrderRevision, Patient, PatientId, Provider, ProviderId, RevisionId, StoreError,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio_postgres::types::FromSql;
use tokio_postgres::Row;

/// A synced table: its name, id column and selected columns
#[derive(Debug, Clone, Copy)]
pub struct SyncTable {
    /// Table name
    pub name: &'static str,
    /// Column used as the tiebreak key
    pub id_column: &'static str,
    /// Comma-separated select list
    pub columns: &'static str,
}

/// Patients table
pub const PATIENTS: SyncTable = SyncTable {
    name: "patients",
    id_column: "uuid",
    columns: "uuid, content, date_created, date_modified, voided",
};

/// Observations table
pub const OBSERVATIONS: SyncTable = SyncTable {
    name: "observations",
    id_column: "uuid",
    columns: "uuid, patient_uuid, observed_at, concept, value, date_modified, voided",
};

/// Order revisions table
pub const ORDER_REVISIONS: SyncTable = SyncTable {
    name: "order_revisions",
    id_column: "revision_id",
    columns: "revision_id, previous_revision, patient_uuid, instructions, scheduled_start, \
              auto_expire, voided, void_reason, orderer, date_created, date_modified",
};

impl SyncTable {
    /// Keyset scan in `(date_modified, id)` order
    ///
    /// Parameters: `$1` bookmark timestamp (nullable), `$2` tiebreak id
    /// (nullable), `$3` include voided, `$4` limit.
    pub fn scan_sql(&self) -> String {
        format!(
            "SELECT {columns} FROM {table} \
             WHERE ($1::timestamptz IS NULL \
                    OR date_modified > $1 \
                    OR (date_modified = $1 AND ($2::text IS NULL OR {id} > $2))) \
               AND ($3 OR NOT voided) \
             ORDER BY date_modified, {id} \
             LIMIT $4",
            columns = self.columns,
            table = self.name,
            id = self.id_column,
        )
    }
}

fn column<'a, T: FromSql<'a>>(row: &'a Row, name: &str) -> StoreResult<T> {
    row.try_get(name)
        .map_err(|e| StoreError::DeserializationFailed(format!("column '{}': {}", name, e)))
}

fn id_error(e: String) -> StoreError {
    StoreError::DeserializationFailed(e)
}

/// Maps a `patients` row
pub fn patient_from_row(row: &Row) -> StoreResult<Patient> {
    Ok(Patient {
        uuid: PatientId::new(column::<String>(row, "uuid")?).map_err(id_error)?,
        content: column::<Value>(row, "content")?,
        date_created: column::<DateTime<Utc>>(row, "date_created")?,
        date_modified: column::<DateTime<Utc>>(row, "date_modified")?,
        voided: column::<bool>(row, "voided")?,
    })
}

/// Maps an `observations` row
pub fn observation_from_row(row: &Row) -> StoreResult<Observation> {
    Ok(Observation {
        uuid: column::<String>(row, "uuid")?,
        patient_id: PatientId::new(column::<String>(row, "patient_uuid")?).map_err(id_error)?,
        observed_at: column::<DateTime<Utc>>(row, "observed_at")?,
        concept: column::<String>(row, "concept")?,
        value: column::<Value>(row, "value")?,
        date_modified: column::<DateTime<Utc>>(row, "date_modified")?,
        voided: column::<bool>(row, "voided")?,
    })
}

/// Maps an `order_revisions` row
pub fn order_revision_from_row(row: &Row) -> StoreResult<OrderRevision> {
    let previous_revision = column::<Option<String>>(row, "previous_revision")?
        .map(RevisionId::new)
        .transpose()
        .map_err(id_error)?;

    Ok(OrderRevision {
        revision_id: RevisionId::new(column::<String>(row, "revision_id")?).map_err(id_error)?,
        previous_revision,
        patient_id: PatientId::new(column::<String>(row, "patient_uuid")?).map_err(id_error)?,
        instructions: column::<String>(row, "instructions")?,
        scheduled_start: column::<Option<DateTime<Utc>>>(row, "scheduled_start")?,
        auto_expire: column::<Option<DateTime<Utc>>>(row, "auto_expire")?,
        voided: column::<bool>(row, "voided")?,
        void_reason: column::<Option<String>>(row, "void_reason")?,
        orderer: ProviderId::new(column::<String>(row, "orderer")?).map_err(id_error)?,
        date_created: column::<DateTime<Utc>>(row, "date_created")?,
        date_modified: column::<DateTime<Utc>>(row, "date_modified")?,
    })
}

/// Maps a `providers` row
pub fn provider_from_row(row: &Row) -> StoreResult<Provider> {
    Ok(Provider {
        id: ProviderId::new(column::<String>(row, "id")?).map_err(id_error)?,
        name: column::<String>(row, "name")?,
        date_created: column::<DateTime<Utc>>(row, "date_created")?,
    })
}
