//! Integration tests for the incremental sync protocol
//!
//! Runs the controller against the in-memory store with a manual clock.

use chrono::{DateTime, Duration, TimeZone, Utc};
use fieldsync::adapters::memory::MemoryStore;
use fieldsync::core::sync::{Bookmark, ManualClock, SyncController, SyncPageFetcher};
use fieldsync::domain::{FieldsyncError, Observation, PatientId};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

fn at(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).unwrap()
}

fn observation(id: &str, modified_millis: i64) -> Observation {
    Observation {
        uuid: id.to_string(),
        patient_id: PatientId::new("patient-1").unwrap(),
        observed_at: at(modified_millis),
        concept: "weight_kg".to_string(),
        value: json!(61.5),
        date_modified: at(modified_millis),
        voided: false,
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
}

impl Harness {
    async fn with(records: &[(&str, i64)], now_millis: i64) -> Self {
        let store = Arc::new(MemoryStore::new());
        for (id, millis) in records {
            store.put_observation(observation(id, *millis)).await;
        }
        Self {
            store,
            clock: Arc::new(ManualClock::new(at(now_millis))),
        }
    }

    fn controller(&self, page_size: usize) -> SyncController<Observation> {
        let fetcher = SyncPageFetcher::<Observation>::new(self.store.clone(), self.clock.clone())
            .with_buffer_millis(30_000);
        SyncController::new(fetcher).with_page_size(page_size)
    }
}

fn ids(results: &[Observation]) -> Vec<&str> {
    results.iter().map(|o| o.uuid.as_str()).collect()
}

#[tokio::test]
async fn test_three_records_two_pages() {
    let harness = Harness::with(&[("a", 10), ("b", 20), ("c", 30)], 1_000_000).await;
    let controller = harness.controller(2);

    let first = controller.sync_since(None).await.unwrap();
    assert_eq!(ids(&first.results), vec!["a", "b"]);
    assert!(first.more);

    let second = controller.sync_since(Some(&first.bookmark)).await.unwrap();
    assert_eq!(ids(&second.results), vec!["c"]);
    assert!(!second.more);

    let third = controller.sync_since(Some(&second.bookmark)).await.unwrap();
    assert!(third.results.is_empty());
    assert!(!third.more);
}

#[tokio::test]
async fn test_ties_at_page_boundary_are_not_lost() {
    let records: Vec<(&str, i64)> = ["e", "a", "d", "b", "c"].iter().map(|id| (*id, 50)).collect();
    let harness = Harness::with(&records, 1_000_000).await;
    let controller = harness.controller(2);

    let mut seen = Vec::new();
    let mut bookmark: Option<String> = None;
    for _ in 0..10 {
        let response = controller.sync_since(bookmark.as_deref()).await.unwrap();
        seen.extend(response.results.iter().map(|o| o.uuid.clone()));
        bookmark = Some(response.bookmark);
        if !response.more {
            break;
        }
    }

    assert_eq!(seen, vec!["a", "b", "c", "d", "e"]);
}

#[tokio::test]
async fn test_sub_microsecond_ties_page_through() {
    let harness = Harness::with(&[], 2_000_000_000_000).await;
    let stamped = Utc.timestamp_nanos(1_000_000_000_123_456_789);
    for id in ["a", "b", "c"] {
        let mut record = observation(id, 0);
        record.date_modified = stamped;
        harness.store.put_observation(record).await;
    }
    let controller = harness.controller(2);

    let first = controller.sync_since(None).await.unwrap();
    assert_eq!(ids(&first.results), vec!["a", "b"]);
    assert!(first.more);

    let second = controller.sync_since(Some(&first.bookmark)).await.unwrap();
    assert_eq!(ids(&second.results), vec!["c"]);
    assert!(!second.more);
}

#[tokio::test]
async fn test_late_commit_within_buffer_is_delivered() {
    let harness = Harness::with(&[("a", 10_000)], 100_000).await;
    let controller = harness.controller(100);

    let first = controller.sync_since(None).await.unwrap();
    assert_eq!(ids(&first.results), vec!["a"]);
    let position = Bookmark::from_store(&first.bookmark).unwrap();
    assert_eq!(position.timestamp(), at(70_000));

    // A transaction that started before the sync commits afterwards with
    // an earlier modification time
    harness.store.put_observation(observation("late", 95_000)).await;
    harness.clock.advance(Duration::seconds(5));

    let second = controller.sync_since(Some(&first.bookmark)).await.unwrap();
    assert_eq!(ids(&second.results), vec!["late"]);
}

#[tokio::test]
async fn test_replaying_a_bookmark_is_idempotent() {
    let harness = Harness::with(&[("a", 10), ("b", 20), ("c", 30), ("d", 40)], 1_000_000).await;
    let controller = harness.controller(2);

    let first = controller.sync_since(None).await.unwrap();
    let again = controller.sync_since(Some(&first.bookmark)).await.unwrap();
    let replay = controller.sync_since(Some(&first.bookmark)).await.unwrap();

    assert_eq!(ids(&again.results), ids(&replay.results));
    assert_eq!(again.bookmark, replay.bookmark);
    assert_eq!(again.more, replay.more);
}

#[tokio::test]
async fn test_bookmarks_never_move_backwards() {
    let records: Vec<(String, i64)> = (0..25).map(|i| (format!("obs-{i:02}"), i * 7 % 40)).collect();
    let refs: Vec<(&str, i64)> = records.iter().map(|(id, m)| (id.as_str(), *m)).collect();
    let harness = Harness::with(&refs, 500_000).await;
    let controller = harness.controller(3);

    let mut previous: Option<DateTime<Utc>> = None;
    let mut bookmark: Option<String> = None;
    let mut delivered = HashSet::new();
    for _ in 0..20 {
        let response = controller.sync_since(bookmark.as_deref()).await.unwrap();
        delivered.extend(response.results.iter().map(|o| o.uuid.clone()));

        let timestamp = Bookmark::from_store(&response.bookmark).unwrap().timestamp();
        if let Some(previous) = previous {
            assert!(timestamp >= previous, "bookmark moved backwards");
        }
        previous = Some(timestamp);
        bookmark = Some(response.bookmark);
        harness.clock.advance(Duration::milliseconds(250));
        if !response.more {
            break;
        }
    }

    assert_eq!(delivered.len(), 25);
}

#[tokio::test]
async fn test_voided_records_follow_request_flag() {
    let harness = Harness::with(&[("a", 10)], 1_000_000).await;
    let mut voided = observation("gone", 20);
    voided.voided = true;
    harness.store.put_observation(voided).await;

    let controller = harness.controller(10);
    let mut request = controller.default_request(None);
    assert!(request.include_voided);
    let with_voided = controller.sync(&request).await.unwrap();
    assert_eq!(ids(&with_voided.results), vec!["a", "gone"]);

    request.include_voided = false;
    let without_voided = controller.sync(&request).await.unwrap();
    assert_eq!(ids(&without_voided.results), vec!["a"]);
}

#[tokio::test]
async fn test_blank_bookmark_starts_from_beginning() {
    let harness = Harness::with(&[("a", 10)], 1_000_000).await;
    let controller = harness.controller(10);

    let response = controller.sync_since(Some("  ")).await.unwrap();
    assert_eq!(ids(&response.results), vec!["a"]);
}

#[tokio::test]
async fn test_malformed_bookmark_is_rejected() {
    let harness = Harness::with(&[], 1_000_000).await;
    let controller = harness.controller(10);

    let err = controller.sync_since(Some("not-a-bookmark!")).await.unwrap_err();
    assert!(matches!(err, FieldsyncError::MalformedBookmark(_)));
    assert!(err.is_client_error());
}
