use super::payload;
use crate::common::{manual_config, start_harness};
use barangay_offline::application::services::NO_CACHE_ADVISORY;
use barangay_offline::{
    AppError, DataSource, EntityId, EntityType, LocalRecord, OfflineServiceTrait,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[tokio::test]
async fn live_fetch_refreshes_snapshot_and_failures_fall_back() {
    let harness = start_harness(manual_config(), true).await;
    let service = harness.runtime.service();

    let live = service
        .fetch_with_cache(EntityType::Announcement, || async {
            Ok(vec![json!({"id": "a1", "title": "Vaccination day"})])
        })
        .await
        .expect("live fetch");
    assert!(!live.is_from_cache);
    assert_eq!(live.source, DataSource::Live);
    assert!(live.error.is_none());

    let fallback = service
        .fetch_with_cache(EntityType::Announcement, || async {
            Err(AppError::Network("upstream 503".into()))
        })
        .await
        .expect("fallback fetch");
    assert!(fallback.is_from_cache);
    assert_eq!(fallback.source, DataSource::StaleCache);
    assert_eq!(fallback.data, live.data);
    assert_eq!(fallback.last_updated, live.last_updated);
    assert!(fallback.error.expect("advisory").contains("upstream 503"));
}

#[tokio::test]
async fn offline_reads_use_snapshot_without_calling_remote() {
    let harness = start_harness(manual_config(), true).await;
    let service = harness.runtime.service();

    service
        .fetch_with_cache(EntityType::Resident, || async {
            Ok(vec![json!({"id": "r1"}), json!({"id": "r2"})])
        })
        .await
        .expect("prime cache");

    harness.runtime.connectivity().set_online(false);
    let called = Arc::new(AtomicBool::new(false));
    let flag = called.clone();
    let offline = service
        .fetch_with_cache(EntityType::Resident, move || async move {
            flag.store(true, Ordering::SeqCst);
            Ok(Vec::new())
        })
        .await
        .expect("offline fetch");

    assert!(!called.load(Ordering::SeqCst));
    assert!(offline.is_from_cache);
    assert_eq!(offline.source, DataSource::Cache);
    assert_eq!(offline.data.len(), 2);
    assert!(offline.error.is_none());
}

#[tokio::test]
async fn missing_snapshot_returns_empty_with_advisory() {
    let harness = start_harness(manual_config(), false).await;
    let service = harness.runtime.service();

    let result = service
        .fetch_with_cache(EntityType::Incident, || async { Ok(Vec::new()) })
        .await
        .expect("offline fetch");
    assert!(result.data.is_empty());
    assert!(result.is_from_cache);
    assert!(result.last_updated.is_none());
    assert_eq!(result.error.as_deref(), Some(NO_CACHE_ADVISORY));

    harness.runtime.connectivity().set_online(true);
    let failed = service
        .fetch_with_cache(EntityType::Incident, || async {
            Err(AppError::Timeout("15s".into()))
        })
        .await
        .expect("failed live fetch");
    assert!(failed.data.is_empty());
    assert_eq!(failed.error.as_deref(), Some(NO_CACHE_ADVISORY));
}

#[tokio::test]
async fn each_live_fetch_replaces_the_whole_snapshot() {
    let harness = start_harness(manual_config(), true).await;
    let service = harness.runtime.service();

    harness
        .remote
        .set_list(Ok(vec![json!({"id": "d1"}), json!({"id": "d2"})]));
    service
        .fetch_list(EntityType::Document)
        .await
        .expect("first fetch");

    harness.remote.set_list(Ok(vec![json!({"id": "d3"})]));
    service
        .fetch_list(EntityType::Document)
        .await
        .expect("second fetch");

    harness.runtime.connectivity().set_online(false);
    let cached = service
        .fetch_list(EntityType::Document)
        .await
        .expect("cached fetch");
    assert_eq!(cached.data, vec![json!({"id": "d3"})]);
}

#[tokio::test]
async fn local_echo_overlays_queued_writes() {
    let harness = start_harness(manual_config(), false).await;
    let service = harness.runtime.service();

    let created = service
        .enqueue_create(EntityType::Resident, payload(json!({"name": "Ana"})))
        .await
        .expect("create");
    let updated = service
        .enqueue_update(
            EntityType::Resident,
            EntityId::new("r1".into()).expect("entity id"),
            payload(json!({"purok": 7})),
        )
        .await
        .expect("update");
    service
        .enqueue_delete(
            EntityType::Resident,
            EntityId::new("r2".into()).expect("entity id"),
        )
        .await
        .expect("delete");

    let confirmed = vec![
        json!({"id": "r1", "name": "Ben", "purok": 2}),
        json!({"id": "r2", "name": "Carla"}),
        json!({"id": "r3", "name": "Dado"}),
    ];
    let merged = service
        .with_local_echo(EntityType::Resident, confirmed)
        .await
        .expect("merge");

    assert_eq!(merged.len(), 3);
    assert_eq!(
        merged[0],
        LocalRecord::PendingLocal {
            record: json!({"id": "r1", "name": "Ben", "purok": 7}),
            operation_id: updated,
        }
    );
    assert_eq!(
        merged[1],
        LocalRecord::Confirmed {
            record: json!({"id": "r3", "name": "Dado"}),
        }
    );
    assert_eq!(merged[2].pending_operation(), Some(&created));
    assert_eq!(merged[2].record(), &json!({"name": "Ana"}));
}
