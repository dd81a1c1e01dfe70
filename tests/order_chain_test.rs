//! Integration tests for order revision chains

use chrono::{Duration, TimeZone, Utc};
use fieldsync::adapters::memory::MemoryStore;
use fieldsync::adapters::store::{OrderStore, Stores};
use fieldsync::config::SyncConfig;
use fieldsync::core::chain::{ChainResolver, NewOrder, OrderEdit};
use fieldsync::core::service::FieldsyncService;
use fieldsync::core::sync::{Clock, ManualClock};
use fieldsync::domain::{
    FieldsyncError, Patient, PatientId, ProviderId, RecordKind, RevisionId,
};
use serde_json::json;
use std::sync::Arc;

async fn setup() -> (Arc<MemoryStore>, Arc<ManualClock>) {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
    ));
    store
        .put_patient(Patient::new(
            PatientId::new("P1").unwrap(),
            json!({"given_name": "Amara"}),
            clock.now(),
        ))
        .await;
    (store, clock)
}

fn service(store: &Arc<MemoryStore>, clock: &Arc<ManualClock>) -> FieldsyncService {
    FieldsyncService::new(
        Stores::from_backend(store.clone()),
        &SyncConfig::default(),
        clock.clone(),
    )
}

#[tokio::test]
async fn test_create_update_delete_retrieve() {
    let (store, clock) = setup().await;
    let service = service(&store, &clock);

    let created = service
        .create_order(&json!({
            "patient_uuid": "P1",
            "instructions": "Paracetamol",
            "start_millis": 1000
        }))
        .await
        .unwrap();
    let created_json = created.to_json();
    let uuid = created_json["uuid"].as_str().unwrap().to_string();
    assert_eq!(created_json["start_millis"], json!(1000));
    assert_eq!(created_json["instructions"], json!("Paracetamol"));

    clock.advance(Duration::seconds(1));
    let updated = service
        .update_order(
            &RevisionId::new(uuid.clone()).unwrap(),
            &json!({"start_millis": null}),
            None,
        )
        .await
        .unwrap()
        .to_json();
    assert_eq!(updated["uuid"], json!(uuid));
    assert!(updated.get("start_millis").is_none());
    assert_eq!(updated["instructions"], json!("Paracetamol"));

    clock.advance(Duration::seconds(1));
    let stable_id = RevisionId::new(uuid.clone()).unwrap();
    let deleted = service.delete_order(&stable_id, "entered in error").await.unwrap();
    assert_eq!(deleted, stable_id);

    let err = service.get_order(&stable_id).await.unwrap_err();
    assert!(matches!(err, FieldsyncError::NotFound(_)));
    assert!(service.list_orders(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_chain_identity_latest_and_deletion() {
    let (store, clock) = setup().await;
    let resolver = ChainResolver::new(store.clone(), clock.clone());
    let orderer = ProviderId::new("prescriber").unwrap();

    let created = resolver
        .create(
            NewOrder {
                uuid: None,
                patient_id: PatientId::new("P1").unwrap(),
                instructions: "dose 0".to_string(),
                scheduled_start: None,
                auto_expire: None,
            },
            &orderer,
        )
        .await
        .unwrap();

    let mut chain = vec![created.current.revision_id.clone()];
    for n in 1..=5 {
        clock.advance(Duration::seconds(1));
        let revised = resolver
            .revise(
                chain.last().unwrap(),
                &[OrderEdit::Instructions(format!("dose {n}"))],
                None,
            )
            .await
            .unwrap();
        chain.push(revised.current.revision_id.clone());
    }
    let final_id = chain.last().unwrap().clone();

    for member in &chain {
        assert_eq!(
            resolver.resolve_identity(member).await.unwrap(),
            created.stable_id
        );
        let latest = resolver.resolve_latest(member).await.unwrap();
        assert_eq!(latest.current.revision_id, final_id);
        assert_eq!(latest.current.instructions, "dose 5");
    }

    resolver.delete(&created.stable_id, "discontinued").await.unwrap();
    for member in &chain {
        let revision = store.get_revision(member).await.unwrap().unwrap();
        assert!(revision.voided);
        assert_eq!(revision.void_reason.as_deref(), Some("discontinued"));
    }
    assert!(matches!(
        resolver.resolve_latest(&created.stable_id).await,
        Err(FieldsyncError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_stale_expected_revision_is_refused() {
    let (store, clock) = setup().await;
    let service = service(&store, &clock);

    let created = service
        .create_order(&json!({"patient_uuid": "P1", "instructions": "Rest"}))
        .await
        .unwrap();
    let first_revision = created.current.revision_id.clone();

    clock.advance(Duration::seconds(1));
    service
        .update_order(
            &created.stable_id,
            &json!({"instructions": "Fluids"}),
            Some(&first_revision),
        )
        .await
        .unwrap();

    let err = service
        .update_order(
            &created.stable_id,
            &json!({"instructions": "Bed rest"}),
            Some(&first_revision),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FieldsyncError::ConcurrentModification { .. }));
}

#[tokio::test]
async fn test_synced_revisions_share_stable_id() {
    let (store, clock) = setup().await;
    let service = service(&store, &clock);

    let created = service
        .create_order(&json!({"patient_uuid": "P1", "instructions": "Rest", "uuid": "order-1"}))
        .await
        .unwrap();
    assert_eq!(created.stable_id.as_str(), "order-1");

    clock.advance(Duration::seconds(1));
    service
        .update_order(&created.stable_id, &json!({"stop_millis": 5000}), None)
        .await
        .unwrap();
    clock.advance(Duration::seconds(1));
    service.delete_order(&created.stable_id, "done").await.unwrap();

    // Move past the bookmark buffer so the short page ends after every write
    clock.advance(Duration::minutes(5));
    let request = service.default_request(RecordKind::Orders, None);
    let response = service.sync(RecordKind::Orders, &request).await.unwrap();

    let results = response["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    for result in results {
        assert_eq!(result["uuid"], json!("order-1"));
        assert_eq!(result["voided"], json!(true));
    }
}

#[tokio::test]
async fn test_create_requires_known_patient() {
    let (store, clock) = setup().await;
    let service = service(&store, &clock);

    let err = service
        .create_order(&json!({"patient_uuid": "P404", "instructions": "Rest"}))
        .await
        .unwrap_err();
    assert!(matches!(err, FieldsyncError::NotFound(_)));

    let err = service
        .create_order(&json!({"patient_uuid": "P1"}))
        .await
        .unwrap_err();
    assert!(matches!(err, FieldsyncError::Validation(_)));
}
