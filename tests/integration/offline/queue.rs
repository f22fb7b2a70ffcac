use super::{clearance, payload};
use crate::common::{manual_config, memory_store, start_harness};
use barangay_offline::application::ports::OfflineQueueStore;
use barangay_offline::domain::entities::offline::OperationDraft;
use barangay_offline::{
    AppError, EntityId, EntityType, OfflineServiceTrait, OperationType, QueuedOperation,
};
use chrono::Utc;
use serde_json::json;

#[tokio::test]
async fn capacity_limit_rejects_then_recovers_after_sync() {
    let mut config = manual_config();
    config.queue.max_queue_size = 3;
    let harness = start_harness(config, true).await;
    let service = harness.runtime.service();

    for index in 0..3 {
        service
            .enqueue_create(EntityType::Incident, payload(json!({"report": index})))
            .await
            .expect("enqueue within limit");
    }

    let err = service
        .enqueue_create(EntityType::Incident, payload(json!({"report": 3})))
        .await
        .expect_err("fourth enqueue should be rejected");
    assert!(matches!(err, AppError::QueueFull(_)));
    assert_eq!(
        service.get_queue_stats().await.expect("stats").total_operations,
        3
    );

    let report = service.force_sync().await.expect("sync");
    assert_eq!(report.synced, 3);

    service
        .enqueue_create(EntityType::Incident, payload(json!({"report": 4})))
        .await
        .expect("enqueue after sync");
}

#[tokio::test]
async fn stats_reflect_pending_size_and_near_limit() {
    let mut config = manual_config();
    config.queue.max_storage_size = 400;
    let harness = start_harness(config, false).await;
    let service = harness.runtime.service();

    let stats = service.get_queue_stats().await.expect("stats");
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.total_size, 0);
    assert!(!stats.is_near_limit);

    service
        .enqueue_create(EntityType::Document, clearance())
        .await
        .expect("enqueue");
    service
        .enqueue_create(EntityType::Document, clearance())
        .await
        .expect("enqueue");

    let operations = service.pending_operations().await.expect("pending");
    let expected: u64 = operations.iter().map(QueuedOperation::size_bytes).sum();

    let stats = service.get_queue_stats().await.expect("stats");
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.total_size, expected);
    assert_eq!(stats.is_near_limit, expected as f64 > 400.0 * 0.8);
    assert_eq!(stats.max_storage_size, 400);
}

#[tokio::test]
async fn update_and_delete_require_an_entity_id() {
    let harness = start_harness(manual_config(), false).await;
    let service = harness.runtime.service();

    let id = service
        .enqueue_update(
            EntityType::Resident,
            EntityId::new("res-12".into()).expect("entity id"),
            payload(json!({"purok": 5})),
        )
        .await
        .expect("update with id");
    let stored = harness
        .store
        .get_operation(&id)
        .await
        .expect("get")
        .expect("stored operation");
    assert_eq!(stored.operation_type, OperationType::Update);
    assert_eq!(
        stored.entity_id.as_ref().map(EntityId::as_str),
        Some("res-12")
    );

    assert!(EntityId::new(String::new()).is_err());
    assert!(
        OperationDraft::new(
            EntityType::Announcement,
            OperationType::Delete,
            payload(json!({})),
            None,
        )
        .is_err()
    );
}

#[tokio::test]
async fn store_contract_duplicate_missing_and_idempotent_delete() {
    let (store, _pool) = memory_store().await;
    let draft = OperationDraft::new(
        EntityType::Announcement,
        OperationType::Create,
        payload(json!({"title": "Clean-up drive"})),
        None,
    )
    .expect("draft");
    let operation = QueuedOperation::from_draft(draft, Utc::now());

    let missing = store
        .update_operation(&operation)
        .await
        .expect_err("update of missing operation");
    assert!(matches!(missing, AppError::NotFound(_)));

    store.add_operation(&operation).await.expect("first add");
    let duplicate = store
        .add_operation(&operation)
        .await
        .expect_err("duplicate add");
    assert!(matches!(duplicate, AppError::DuplicateKey(_)));

    store.delete_operation(&operation.id).await.expect("delete");
    store
        .delete_operation(&operation.id)
        .await
        .expect("second delete is a no-op");
    assert!(store.list_operations().await.expect("list").is_empty());
}

#[tokio::test]
async fn non_object_payload_is_rejected() {
    assert!(barangay_offline::OfflinePayload::new(json!([1, 2, 3])).is_err());
    assert!(barangay_offline::OfflinePayload::new(json!("text")).is_err());
}
