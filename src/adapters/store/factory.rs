//! Store factory
//!
//! Builds the configured backend and hands out one trait object per concern.

use super::traits::{ChangeStore, OrderStore, ProviderStore, StoreAdmin};
use crate::adapters::memory::{Fixtures, MemoryStore};
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::{FieldsyncConfig, StoreTarget};
use crate::domain::{FieldsyncError, Observation, OrderRevision, Patient, Result};
use std::sync::Arc;

/// Every store interface, backed by a single backend instance
#[derive(Clone)]
pub struct Stores {
    /// Patient change scans
    pub patients: Arc<dyn ChangeStore<Patient>>,

    /// Observation change scans
    pub observations: Arc<dyn ChangeStore<Observation>>,

    /// Order revision change scans
    pub order_changes: Arc<dyn ChangeStore<OrderRevision>>,

    /// Order revision reads and writes
    pub orders: Arc<dyn OrderStore>,

    /// Provider reads and writes
    pub providers: Arc<dyn ProviderStore>,

    /// Connection-level operations
    pub admin: Arc<dyn StoreAdmin>,
}

impl Stores {
    /// Wraps one backend that implements every store trait
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: ChangeStore<Patient>
            + ChangeStore<Observation>
            + ChangeStore<OrderRevision>
            + OrderStore
            + ProviderStore
            + StoreAdmin
            + 'static,
    {
        Self {
            patients: backend.clone(),
            observations: backend.clone(),
            order_changes: backend.clone(),
            orders: backend.clone(),
            providers: backend.clone(),
            admin: backend,
        }
    }
}

/// Create the store selected by `store_target`
///
/// # Errors
///
/// Returns an error if the PostgreSQL section is missing, the pool cannot
/// be created, or the memory fixtures file cannot be loaded.
pub async fn create_store(config: &FieldsyncConfig) -> Result<Stores> {
    match config.store_target {
        StoreTarget::Memory => {
            tracing::info!("Creating in-memory store");
            let store = Arc::new(MemoryStore::new());
            if let Some(path) = config.memory.fixtures_path.as_deref() {
                let seeded = Fixtures::load(path).await?.seed(&store).await;
                tracing::info!(path, records = seeded, "Seeded in-memory store");
            }
            Ok(Stores::from_backend(store))
        }
        StoreTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                FieldsyncError::Configuration(
                    "store_target is 'postgresql' but [postgresql] is missing".to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL store");
            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            Ok(Stores::from_backend(Arc::new(PostgreSQLAdapter::new(client))))
        }
    }
}
