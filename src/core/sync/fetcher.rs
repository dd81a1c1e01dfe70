//! Sync page fetcher
//!
//! Fetches a single page of changes and works out the bookmark the client
//! should resume from. The store is read at-or-after the incoming bookmark,
//! then the outgoing bookmark is clamped `buffer` behind the current time so
//! that rows written by transactions still in flight are picked up by a
//! later sync instead of being skipped.

use super::bookmark::{Bookmark, DEFAULT_BUFFER_MILLIS};
use super::clock::Clock;
use super::page::SyncPage;
use crate::adapters::store::ChangeStore;
use crate::domain::{FieldsyncError, Result, SyncRecord};
use std::sync::Arc;

/// Fetches pages of one record kind
pub struct SyncPageFetcher<R: SyncRecord> {
    store: Arc<dyn ChangeStore<R>>,
    clock: Arc<dyn Clock>,
    buffer_millis: i64,
}

impl<R: SyncRecord> SyncPageFetcher<R> {
    /// Creates a fetcher with the default buffer
    pub fn new(store: Arc<dyn ChangeStore<R>>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            buffer_millis: DEFAULT_BUFFER_MILLIS,
        }
    }

    /// Overrides the clamp buffer
    pub fn with_buffer_millis(mut self, buffer_millis: i64) -> Self {
        self.buffer_millis = buffer_millis;
        self
    }

    /// Fetches one page of records modified at or after `bookmark`
    ///
    /// `None` starts from the beginning of history. The store read is the
    /// only side effect, so a failed fetch can be retried with the same
    /// bookmark.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `max_results` is zero and `SyncFetch` if the
    /// store read fails.
    pub async fn fetch(
        &self,
        bookmark: Option<&Bookmark>,
        include_voided: bool,
        max_results: usize,
    ) -> Result<SyncPage<R>> {
        if max_results == 0 {
            return Err(FieldsyncError::Validation(
                "max_results must be at least 1".to_string(),
            ));
        }

        // Read the clock before the scan: anything committed after this
        // instant is at or after the bookmark we hand out.
        let now = self.clock.now();

        let results = self
            .store
            .scan(bookmark, max_results, include_voided)
            .await
            .map_err(FieldsyncError::SyncFetch)?;

        let position = match results.last() {
            Some(last) if results.len() == max_results => {
                Bookmark::new(last.date_modified(), Some(last.sync_id().to_string()))
            }
            _ => Bookmark::new(now, None),
        };
        let next = position
            .with_buffer_millis(self.buffer_millis)
            .clamp_to_buffered_request_time(now);

        tracing::debug!(
            kind = %R::KIND,
            count = results.len(),
            max_results,
            next_timestamp = %next.timestamp(),
            "Fetched sync page"
        );

        Ok(SyncPage::new(results, next, max_results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::core::sync::clock::ManualClock;
    use crate::domain::{Patient, PatientId};
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    async fn store_with(times: &[(i64, &str)]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for (millis, id) in times {
            store
                .put_patient(Patient::new(PatientId::new(*id).unwrap(), json!({}), at(*millis)))
                .await;
        }
        store
    }

    #[tokio::test]
    async fn test_zero_page_size_is_rejected() {
        let store = store_with(&[]).await;
        let fetcher =
            SyncPageFetcher::<Patient>::new(store, Arc::new(ManualClock::new(at(0))));

        let err = fetcher.fetch(None, true, 0).await.unwrap_err();
        assert!(matches!(err, FieldsyncError::Validation(_)));
    }

    #[tokio::test]
    async fn test_full_page_bookmarks_last_record() {
        let store = store_with(&[(10, "a"), (20, "b"), (30, "c")]).await;
        let fetcher =
            SyncPageFetcher::<Patient>::new(store, Arc::new(ManualClock::new(at(1_000_000))))
                .with_buffer_millis(1_000);

        let page = fetcher.fetch(None, true, 2).await.unwrap();
        assert!(page.more());
        assert_eq!(page.bookmark().timestamp(), at(20));
        assert_eq!(page.bookmark().tiebreak_id(), Some("b"));
    }

    #[tokio::test]
    async fn test_short_page_bookmarks_buffered_now() {
        let store = store_with(&[(10, "a")]).await;
        let fetcher =
            SyncPageFetcher::<Patient>::new(store, Arc::new(ManualClock::new(at(50_000))))
                .with_buffer_millis(1_000);

        let page = fetcher.fetch(None, true, 2).await.unwrap();
        assert!(!page.more());
        assert_eq!(page.bookmark().timestamp(), at(49_000));
        assert_eq!(page.bookmark().tiebreak_id(), None);
    }

    #[tokio::test]
    async fn test_recent_full_page_is_clamped() {
        let store = store_with(&[(49_500, "a"), (49_800, "b")]).await;
        let fetcher =
            SyncPageFetcher::<Patient>::new(store, Arc::new(ManualClock::new(at(50_000))))
                .with_buffer_millis(1_000);

        let page = fetcher.fetch(None, true, 2).await.unwrap();
        assert_eq!(page.bookmark().timestamp(), at(49_000));
        assert_eq!(page.bookmark().tiebreak_id(), None);
    }
}
