//! PostgreSQL adapter implementing the store traits

use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{
    observation_from_row, order_revision_from_row, patient_from_row, provider_from_row, SyncTable,
    OBSERVATIONS, ORDER_REVISIONS, PATIENTS,
};
use crate::adapters::store::{ChangeStore, OrderStore, ProviderStore, StoreAdmin, StoreResult};
use crate::core::sync::Bookmark;
use crate::domain::{
    Observation, OrderRevision, Patient, PatientId, Provider, ProviderId, RevisionId, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;

/// PostgreSQL implementation of the store traits
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    /// Create a new PostgreSQL adapter
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }

    async fn scan_table(
        &self,
        table: SyncTable,
        after: Option<&Bookmark>,
        limit: usize,
        include_voided: bool,
    ) -> StoreResult<Vec<Row>> {
        let since: Option<DateTime<Utc>> = after.map(Bookmark::timestamp);
        let tiebreak: Option<&str> = after.and_then(Bookmark::tiebreak_id);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = self
            .client
            .query(
                &table.scan_sql(),
                &[&since, &tiebreak, &include_voided, &limit],
            )
            .await?;

        tracing::debug!(
            table = table.name,
            rows = rows.len(),
            limit,
            "Scanned PostgreSQL table"
        );
        Ok(rows)
    }
}

fn map_rows<T>(rows: &[Row], map: fn(&Row) -> StoreResult<T>) -> StoreResult<Vec<T>> {
    rows.iter().map(map).collect()
}

/// Turns a primary-key violation into a readable write error
fn duplicate_as_write_error(err: StoreError, what: &str) -> StoreError {
    match err {
        StoreError::WriteFailed(msg) if msg.contains(SqlState::UNIQUE_VIOLATION.code()) => {
            StoreError::WriteFailed(format!("{what} already exists"))
        }
        other => other,
    }
}

#[async_trait]
impl ChangeStore<Patient> for PostgreSQLAdapter {
    async fn scan(
        &self,
        after: Option<&Bookmark>,
        limit: usize,
        include_voided: bool,
    ) -> StoreResult<Vec<Patient>> {
        let rows = self.scan_table(PATIENTS, after, limit, include_voided).await?;
        map_rows(&rows, patient_from_row)
    }
}

#[async_trait]
impl ChangeStore<Observation> for PostgreSQLAdapter {
    async fn scan(
        &self,
        after: Option<&Bookmark>,
        limit: usize,
        include_voided: bool,
    ) -> StoreResult<Vec<Observation>> {
        let rows = self
            .scan_table(OBSERVATIONS, after, limit, include_voided)
            .await?;
        map_rows(&rows, observation_from_row)
    }
}

#[async_trait]
impl ChangeStore<OrderRevision> for PostgreSQLAdapter {
    async fn scan(
        &self,
        after: Option<&Bookmark>,
        limit: usize,
        include_voided: bool,
    ) -> StoreResult<Vec<OrderRevision>> {
        let rows = self
            .scan_table(ORDER_REVISIONS, after, limit, include_voided)
            .await?;
        map_rows(&rows, order_revision_from_row)
    }
}

#[async_trait]
impl OrderStore for PostgreSQLAdapter {
    async fn patient_exists(&self, patient_id: &PatientId) -> StoreResult<bool> {
        let rows = self
            .client
            .query(
                "SELECT 1 FROM patients WHERE uuid = $1",
                &[&patient_id.as_str()],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn get_revision(&self, revision_id: &RevisionId) -> StoreResult<Option<OrderRevision>> {
        let sql = format!(
            "SELECT {} FROM order_revisions WHERE revision_id = $1",
            ORDER_REVISIONS.columns
        );
        let rows = self.client.query(&sql, &[&revision_id.as_str()]).await?;
        rows.first().map(order_revision_from_row).transpose()
    }

    async fn revisions_for_patient(
        &self,
        patient_id: &PatientId,
    ) -> StoreResult<Vec<OrderRevision>> {
        let sql = format!(
            "SELECT {} FROM order_revisions WHERE patient_uuid = $1",
            ORDER_REVISIONS.columns
        );
        let rows = self.client.query(&sql, &[&patient_id.as_str()]).await?;
        map_rows(&rows, order_revision_from_row)
    }

    async fn all_revisions(&self) -> StoreResult<Vec<OrderRevision>> {
        let sql = format!("SELECT {} FROM order_revisions", ORDER_REVISIONS.columns);
        let rows = self.client.query(&sql, &[]).await?;
        map_rows(&rows, order_revision_from_row)
    }

    async fn insert_revision(&self, revision: &OrderRevision) -> StoreResult<()> {
        let previous = revision.previous_revision.as_ref().map(RevisionId::as_str);
        self.client
            .execute(
                "INSERT INTO order_revisions (
                    revision_id, previous_revision, patient_uuid, instructions,
                    scheduled_start, auto_expire, voided, void_reason, orderer,
                    date_created, date_modified
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
                &[
                    &revision.revision_id.as_str(),
                    &previous,
                    &revision.patient_id.as_str(),
                    &revision.instructions,
                    &revision.scheduled_start,
                    &revision.auto_expire,
                    &revision.voided,
                    &revision.void_reason,
                    &revision.orderer.as_str(),
                    &revision.date_created,
                    &revision.date_modified,
                ],
            )
            .await
            .map_err(|e| {
                duplicate_as_write_error(e, &format!("order revision {}", revision.revision_id))
            })?;

        tracing::debug!(revision_id = %revision.revision_id, "Inserted order revision");
        Ok(())
    }

    async fn void_revisions(
        &self,
        revision_ids: &[RevisionId],
        reason: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let ids: Vec<String> = revision_ids.iter().map(ToString::to_string).collect();
        let updated = self
            .client
            .execute(
                "UPDATE order_revisions
                 SET voided = TRUE, void_reason = $2, date_modified = $3
                 WHERE revision_id = ANY($1)",
                &[&ids, &reason, &at],
            )
            .await?;

        tracing::debug!(requested = ids.len(), updated, "Voided order revisions");
        Ok(())
    }
}

#[async_trait]
impl ProviderStore for PostgreSQLAdapter {
    async fn get_provider(&self, provider_id: &ProviderId) -> StoreResult<Option<Provider>> {
        let rows = self
            .client
            .query(
                "SELECT id, name, date_created FROM providers WHERE id = $1",
                &[&provider_id.as_str()],
            )
            .await?;
        rows.first().map(provider_from_row).transpose()
    }

    async fn insert_provider(&self, provider: &Provider) -> StoreResult<()> {
        self.client
            .execute(
                "INSERT INTO providers (id, name, date_created) VALUES ($1, $2, $3)",
                &[&provider.id.as_str(), &provider.name, &provider.date_created],
            )
            .await
            .map_err(|e| duplicate_as_write_error(e, &format!("provider {}", provider.id)))?;
        Ok(())
    }

    async fn list_providers(&self) -> StoreResult<Vec<Provider>> {
        let rows = self
            .client
            .query("SELECT id, name, date_created FROM providers ORDER BY id", &[])
            .await?;
        map_rows(&rows, provider_from_row)
    }
}

#[async_trait]
impl StoreAdmin for PostgreSQLAdapter {
    fn backend_name(&self) -> &'static str {
        "postgresql"
    }

    async fn test_connection(&self) -> StoreResult<()> {
        self.client.test_connection().await
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        self.client.ensure_schema().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_is_reworded() {
        let err = StoreError::WriteFailed(format!(
            "db error: ERROR: duplicate key value ({})",
            SqlState::UNIQUE_VIOLATION.code()
        ));
        let mapped = duplicate_as_write_error(err, "provider guest");
        assert_eq!(mapped.to_string(), "Write failed: provider guest already exists");

        let other = duplicate_as_write_error(StoreError::Timeout("slow".to_string()), "x");
        assert!(matches!(other, StoreError::Timeout(_)));
    }
}
