//! Guest provider management
//!
//! Orders created by unauthenticated field clients are attributed to one
//! shared guest provider, created on first use.

use crate::adapters::store::ProviderStore;
use crate::core::sync::Clock;
use crate::domain::{Provider, ProviderId, Result, GUEST_PROVIDER_ID, GUEST_PROVIDER_NAME};
use std::sync::OnceLock;
use tokio::sync::Mutex;

/// Serialises guest provider creation across the whole process
static GUEST_PROVIDER_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Returns the guest provider, creating it if it does not exist yet
///
/// Safe to call concurrently: only one caller performs the lookup-and-insert
/// at a time, so at most one guest provider is ever written by this process.
pub async fn ensure_guest_provider(
    store: &dyn ProviderStore,
    clock: &dyn Clock,
) -> Result<Provider> {
    let _guard = GUEST_PROVIDER_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .await;

    let id = ProviderId::new(GUEST_PROVIDER_ID).map_err(crate::domain::FieldsyncError::Other)?;
    if let Some(existing) = store.get_provider(&id).await? {
        return Ok(existing);
    }

    let provider = Provider::new(id, GUEST_PROVIDER_NAME, clock.now());
    store.insert_provider(&provider).await?;
    tracing::info!(provider_id = %provider.id, "Created guest provider");
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::core::sync::SystemClock;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_guest_provider_is_created_once() {
        let store = MemoryStore::new();

        let first = ensure_guest_provider(&store, &SystemClock).await.unwrap();
        let second = ensure_guest_provider(&store, &SystemClock).await.unwrap();

        assert!(first.is_guest());
        assert_eq!(first, second);
        assert_eq!(store.list_providers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_guest() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { ensure_guest_provider(store.as_ref(), &SystemClock).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.list_providers().await.unwrap().len(), 1);
    }
}
