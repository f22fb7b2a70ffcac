use super::clearance;
use crate::common::{
    RecordingRemote, manual_config, memory_store, start_harness, start_harness_with_store,
    wait_for_event,
};
use barangay_offline::application::ports::OfflineQueueStore;
use barangay_offline::domain::entities::offline::OperationDraft;
use barangay_offline::{
    AppConfig, AppError, ChangeListener, EntityType, OfflineEvent, OfflineRuntime,
    OfflineServiceTrait, OperationType, QueuedOperation,
};
use chrono::Utc;
use std::sync::Arc;

fn auto_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.sync.batch_pause_ms = 0;
    config
}

#[tokio::test]
async fn offline_create_syncs_after_reconnect() {
    let harness = start_harness(auto_config(), false).await;
    let service = harness.runtime.service();
    let mut events = service.subscribe_events();

    service
        .enqueue_create(EntityType::Document, clearance())
        .await
        .expect("enqueue offline");

    let stats = service.get_queue_stats().await.expect("stats");
    assert_eq!(stats.pending, 1);
    assert!(harness.remote.calls().is_empty());

    harness.runtime.connectivity().set_online(true);
    wait_for_event(&mut events, |event| {
        *event == OfflineEvent::ConnectionRestored
    })
    .await;
    let completed = wait_for_event(&mut events, |event| {
        matches!(event, OfflineEvent::SyncCompleted { .. })
    })
    .await;
    assert_eq!(
        completed,
        OfflineEvent::SyncCompleted {
            synced: 1,
            failed: 0,
            dropped: Vec::new(),
        }
    );

    let calls = harness.remote.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "create");
    assert_eq!(calls[0].entity_type, EntityType::Document);
    assert_eq!(
        calls[0].payload,
        Some(serde_json::json!({"type": "Barangay Clearance"}))
    );

    let status = service.get_connectivity_status().await.expect("status");
    assert!(status.is_online);
    assert!(!status.is_syncing);
    assert_eq!(status.pending_operations, 0);
    assert!(status.last_sync_time.is_some());
}

#[tokio::test]
async fn reconnect_right_after_start_syncs_queued_work() {
    let (store, pool) = memory_store().await;
    let draft = OperationDraft::new(EntityType::Document, OperationType::Create, clearance(), None)
        .expect("draft");
    let operation = QueuedOperation::from_draft(draft, Utc::now());
    store.add_operation(&operation).await.expect("add");

    let harness = start_harness_with_store(auto_config(), false, store, pool).await;
    let service = harness.runtime.service();
    let mut events = service.subscribe_events();
    harness.runtime.connectivity().set_online(true);

    wait_for_event(&mut events, |event| {
        matches!(event, OfflineEvent::SyncCompleted { synced: 1, .. })
    })
    .await;
    assert_eq!(harness.remote.calls().len(), 1);
    assert_eq!(service.get_queue_stats().await.expect("stats").pending, 0);
}

#[tokio::test]
async fn enqueue_while_online_triggers_a_pass() {
    let harness = start_harness(auto_config(), true).await;
    let service = harness.runtime.service();
    let mut events = service.subscribe_events();

    service
        .enqueue_create(EntityType::Incident, clearance())
        .await
        .expect("enqueue");

    wait_for_event(&mut events, |event| {
        matches!(event, OfflineEvent::SyncCompleted { synced: 1, .. })
    })
    .await;
    assert_eq!(service.get_queue_stats().await.expect("stats").pending, 0);
}

#[tokio::test]
async fn connection_loss_is_published() {
    let harness = start_harness(manual_config(), true).await;
    let service = harness.runtime.service();
    let mut events = service.subscribe_events();

    harness.runtime.connectivity().set_online(false);
    wait_for_event(&mut events, |event| *event == OfflineEvent::ConnectionLost).await;

    let status = service.get_connectivity_status().await.expect("status");
    assert!(!status.is_online);
    assert!(status.last_sync_time.is_none());
}

#[tokio::test]
async fn interrupted_operations_are_recovered_on_start() {
    let (store, pool) = memory_store().await;
    let draft = OperationDraft::new(
        EntityType::Announcement,
        OperationType::Create,
        clearance(),
        None,
    )
    .expect("draft");
    let mut operation = QueuedOperation::from_draft(draft, Utc::now());
    operation.mark_syncing();
    store.add_operation(&operation).await.expect("add");

    let harness = start_harness_with_store(manual_config(), false, store, pool).await;
    let service = harness.runtime.service();

    let pending = service.pending_operations().await.expect("pending");
    assert_eq!(pending.len(), 1);
    assert!(pending[0].is_pending());
    assert_eq!(service.get_queue_stats().await.expect("stats").pending, 1);
}

#[tokio::test]
async fn last_sync_time_survives_restart() {
    let (store, pool) = memory_store().await;
    let harness = start_harness_with_store(manual_config(), true, store.clone(), pool.clone()).await;
    harness
        .runtime
        .service()
        .force_sync()
        .await
        .expect("empty pass");
    let first = harness
        .runtime
        .service()
        .get_connectivity_status()
        .await
        .expect("status")
        .last_sync_time
        .expect("last sync time");
    drop(harness);

    let restarted = start_harness_with_store(manual_config(), false, store, pool).await;
    let restored = restarted
        .runtime
        .service()
        .get_connectivity_status()
        .await
        .expect("status")
        .last_sync_time
        .expect("restored sync time");
    assert_eq!(restored.timestamp(), first.timestamp());
}

#[tokio::test]
async fn shutdown_releases_remote_subscriptions() {
    let harness = start_harness(manual_config(), true).await;
    let service = harness.runtime.service();
    let listener: ChangeListener = Arc::new(|_change| {});

    let documents = service
        .subscribe(EntityType::Document, listener.clone())
        .await
        .expect("subscribe documents");
    service
        .subscribe(EntityType::Incident, listener.clone())
        .await
        .expect("subscribe incidents");
    service
        .subscribe(EntityType::Incident, listener)
        .await
        .expect("subscribe incidents again");

    let registry = service.subscriptions();
    assert_eq!(registry.active().await, 3);
    assert_eq!(registry.active_for(EntityType::Incident).await, 2);
    assert_eq!(harness.remote.active_subscriptions(), 3);

    registry.unsubscribe(&documents).await.expect("unsubscribe");
    registry
        .unsubscribe(&documents)
        .await
        .expect("unknown handle is ignored");
    assert_eq!(harness.remote.active_subscriptions(), 2);

    let remote = harness.remote.clone();
    harness.runtime.shutdown().await;
    assert_eq!(remote.active_subscriptions(), 0);
}

#[tokio::test]
async fn runtime_requires_a_remote_store() {
    let err = OfflineRuntime::builder(manual_config())
        .start()
        .await
        .err()
        .expect("missing remote");
    assert!(matches!(err, AppError::ConfigurationError(_)));

    let mut config = manual_config();
    config.sync.batch_size = 0;
    let err = OfflineRuntime::builder(config)
        .with_remote(RecordingRemote::new())
        .start()
        .await
        .err()
        .expect("invalid config");
    assert!(matches!(err, AppError::ConfigurationError(_)));
}

#[tokio::test]
async fn runtime_opens_file_database_from_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("offline").join("queue.db");
    let mut config = manual_config();
    config.database.url = format!("sqlite://{}", db_path.display());

    let remote = RecordingRemote::new();
    let runtime = OfflineRuntime::builder(config.clone())
        .with_remote(remote.clone())
        .initially_online(false)
        .start()
        .await
        .expect("start");
    runtime
        .service()
        .enqueue_create(EntityType::Document, clearance())
        .await
        .expect("enqueue");
    runtime.shutdown().await;
    assert!(db_path.exists());

    let reopened = OfflineRuntime::builder(config)
        .with_remote(remote)
        .initially_online(false)
        .start()
        .await
        .expect("restart");
    let pending = reopened
        .service()
        .pending_operations()
        .await
        .expect("pending");
    assert_eq!(pending.len(), 1);
    reopened.shutdown().await;
}

#[tokio::test]
async fn periodic_timer_retries_pending_work() {
    let mut config = auto_config();
    config.sync.sync_interval = 1;
    let harness = start_harness(config, true).await;
    let service = harness.runtime.service();
    let mut events = service.subscribe_events();
    harness
        .remote
        .script(vec![Some(AppError::Network("flaky uplink".into()))]);

    service
        .enqueue_create(EntityType::Transaction, clearance())
        .await
        .expect("enqueue");

    wait_for_event(&mut events, |event| {
        matches!(event, OfflineEvent::SyncCompleted { failed: 1, .. })
    })
    .await;

    wait_for_event(&mut events, |event| {
        matches!(event, OfflineEvent::SyncCompleted { synced: 1, .. })
    })
    .await;
    assert_eq!(service.get_queue_stats().await.expect("stats").pending, 0);
}
