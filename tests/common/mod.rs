#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use barangay_offline::application::services::OfflineEvent;
use barangay_offline::infrastructure::database::ConnectionPool;
use barangay_offline::infrastructure::offline::SqliteOfflineStore;
use barangay_offline::{
    AppConfig, AppError, ChangeListener, EntityId, EntityType, OfflineRuntime, RemoteStore,
    SubscriptionHandle,
};
use serde_json::Value;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub method: &'static str,
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    pub payload: Option<Value>,
}

/// In-memory remote store that records every write it receives.
#[derive(Default)]
pub struct RecordingRemote {
    calls: Mutex<Vec<RemoteCall>>,
    scripted: Mutex<VecDeque<Option<AppError>>>,
    always_fail: Mutex<Option<AppError>>,
    list_result: Mutex<Option<Result<Vec<Value>, AppError>>>,
    delay: Mutex<Option<Duration>>,
    subscriptions: Mutex<HashSet<String>>,
    next_subscription: AtomicU64,
}

impl RecordingRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Outcomes for the next write calls in order; `None` succeeds.
    pub fn script(&self, outcomes: Vec<Option<AppError>>) {
        *self.scripted.lock().expect("script lock") = outcomes.into();
    }

    pub fn fail_always(&self, err: AppError) {
        *self.always_fail.lock().expect("fail lock") = Some(err);
    }

    pub fn recover(&self) {
        *self.always_fail.lock().expect("fail lock") = None;
    }

    pub fn set_list(&self, result: Result<Vec<Value>, AppError>) {
        *self.list_result.lock().expect("list lock") = Some(result);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().expect("delay lock") = Some(delay);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.lock().expect("subscriptions lock").len()
    }

    async fn record(&self, call: RemoteCall) -> Result<(), AppError> {
        let delay = *self.delay.lock().expect("delay lock");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().expect("calls lock").push(call);

        if let Some(err) = self.always_fail.lock().expect("fail lock").clone() {
            return Err(err);
        }
        match self.scripted.lock().expect("script lock").pop_front() {
            Some(Some(err)) => Err(err),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteStore for RecordingRemote {
    async fn create(&self, entity_type: EntityType, payload: &Value) -> Result<Value, AppError> {
        self.record(RemoteCall {
            method: "create",
            entity_type,
            entity_id: None,
            payload: Some(payload.clone()),
        })
        .await?;
        Ok(payload.clone())
    }

    async fn update(
        &self,
        entity_type: EntityType,
        entity_id: &EntityId,
        payload: &Value,
    ) -> Result<Value, AppError> {
        self.record(RemoteCall {
            method: "update",
            entity_type,
            entity_id: Some(entity_id.to_string()),
            payload: Some(payload.clone()),
        })
        .await?;
        Ok(payload.clone())
    }

    async fn delete(&self, entity_type: EntityType, entity_id: &EntityId) -> Result<(), AppError> {
        self.record(RemoteCall {
            method: "delete",
            entity_type,
            entity_id: Some(entity_id.to_string()),
            payload: None,
        })
        .await
    }

    async fn list(&self, _entity_type: EntityType) -> Result<Vec<Value>, AppError> {
        self.list_result
            .lock()
            .expect("list lock")
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn subscribe(
        &self,
        entity_type: EntityType,
        _on_change: ChangeListener,
    ) -> Result<SubscriptionHandle, AppError> {
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        let handle = format!("{entity_type}-{id}");
        self.subscriptions
            .lock()
            .expect("subscriptions lock")
            .insert(handle.clone());
        Ok(SubscriptionHandle::new(handle))
    }

    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<(), AppError> {
        self.subscriptions
            .lock()
            .expect("subscriptions lock")
            .remove(handle.as_str());
        Ok(())
    }
}

pub struct TestHarness {
    pub runtime: OfflineRuntime,
    pub remote: Arc<RecordingRemote>,
    pub store: Arc<SqliteOfflineStore>,
    pub pool: ConnectionPool,
}

/// Manual-sync config: no periodic timer, no automatic passes, no pause.
pub fn manual_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.sync.auto_sync = false;
    config.sync.batch_pause_ms = 0;
    config
}

pub async fn memory_store() -> (Arc<SqliteOfflineStore>, ConnectionPool) {
    let pool = ConnectionPool::in_memory().await.expect("in-memory sqlite");
    pool.migrate().await.expect("migrations");
    let store = Arc::new(SqliteOfflineStore::new(pool.get_pool().clone()));
    (store, pool)
}

pub async fn start_harness(config: AppConfig, online: bool) -> TestHarness {
    let (store, pool) = memory_store().await;
    start_harness_with_store(config, online, store, pool).await
}

pub async fn start_harness_with_store(
    config: AppConfig,
    online: bool,
    store: Arc<SqliteOfflineStore>,
    pool: ConnectionPool,
) -> TestHarness {
    let remote = RecordingRemote::new();
    let runtime = OfflineRuntime::builder(config)
        .with_store(store.clone())
        .with_remote(remote.clone())
        .initially_online(online)
        .start()
        .await
        .expect("runtime start");

    TestHarness {
        runtime,
        remote,
        store,
        pool,
    }
}

pub async fn wait_for_event<F>(
    events: &mut broadcast::Receiver<OfflineEvent>,
    mut predicate: F,
) -> OfflineEvent
where
    F: FnMut(&OfflineEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("event within timeout")
}
