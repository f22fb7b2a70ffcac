use crate::application::ports::{ChangeListener, SubscriptionHandle};
use crate::application::services::cache_service::{CachedFetch, ReadThroughCache};
use crate::application::services::connectivity_service::ConnectivityMonitor;
use crate::application::services::event_bus::{OfflineEvent, OfflineEventBus};
use crate::application::services::queue_service::OperationQueue;
use crate::application::services::subscription_registry::SubscriptionRegistry;
use crate::application::services::sync_coordinator::SyncHandle;
use crate::application::services::sync_service::SyncEngine;
use crate::domain::entities::offline::{
    ConnectivityStatus, DeadLetter, LocalRecord, QueueStats, QueuedOperation, SyncReport,
};
use crate::domain::value_objects::{
    EntityId, EntityType, OfflinePayload, OperationId, OperationType,
};
use crate::infrastructure::offline::SyncMetricsSnapshot;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;

#[async_trait]
pub trait OfflineServiceTrait: Send + Sync {
    async fn enqueue_create(
        &self,
        entity_type: EntityType,
        payload: OfflinePayload,
    ) -> Result<OperationId, AppError>;
    async fn enqueue_update(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
        payload: OfflinePayload,
    ) -> Result<OperationId, AppError>;
    async fn enqueue_delete(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
    ) -> Result<OperationId, AppError>;
    async fn get_queue_stats(&self) -> Result<QueueStats, AppError>;
    async fn get_connectivity_status(&self) -> Result<ConnectivityStatus, AppError>;
    /// Fails with `Offline` when disconnected; otherwise resolves with the
    /// report of the pass that ran (or was already running).
    async fn force_sync(&self) -> Result<SyncReport, AppError>;
    async fn fetch_list(&self, entity_type: EntityType) -> Result<CachedFetch, AppError>;
    async fn pending_operations(&self) -> Result<Vec<QueuedOperation>, AppError>;
    async fn dead_letters(&self) -> Result<Vec<DeadLetter>, AppError>;
    async fn purge_dead_letters(&self) -> Result<u64, AppError>;
}

/// Everything the UI layer talks to.
pub struct OfflineService {
    queue: Arc<OperationQueue>,
    cache: Arc<ReadThroughCache>,
    engine: Arc<SyncEngine>,
    connectivity: Arc<ConnectivityMonitor>,
    events: OfflineEventBus,
    sync: SyncHandle,
    subscriptions: Arc<SubscriptionRegistry>,
}

impl OfflineService {
    pub fn new(
        queue: Arc<OperationQueue>,
        cache: Arc<ReadThroughCache>,
        engine: Arc<SyncEngine>,
        connectivity: Arc<ConnectivityMonitor>,
        events: OfflineEventBus,
        sync: SyncHandle,
        subscriptions: Arc<SubscriptionRegistry>,
    ) -> Self {
        Self {
            queue,
            cache,
            engine,
            connectivity,
            events,
            sync,
            subscriptions,
        }
    }

    pub async fn fetch_with_cache<F, Fut>(
        &self,
        entity_type: EntityType,
        fetch: F,
    ) -> Result<CachedFetch, AppError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Vec<Value>, AppError>> + Send,
    {
        self.cache.fetch_with_cache(entity_type, fetch).await
    }

    pub async fn with_local_echo(
        &self,
        entity_type: EntityType,
        records: Vec<Value>,
    ) -> Result<Vec<LocalRecord>, AppError> {
        self.cache.with_local_echo(entity_type, records).await
    }

    pub async fn subscribe(
        &self,
        entity_type: EntityType,
        on_change: ChangeListener,
    ) -> Result<SubscriptionHandle, AppError> {
        self.subscriptions.subscribe(entity_type, on_change).await
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<OfflineEvent> {
        self.events.subscribe()
    }

    pub fn subscriptions(&self) -> &Arc<SubscriptionRegistry> {
        &self.subscriptions
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn sync_metrics(&self) -> SyncMetricsSnapshot {
        self.engine.metrics().snapshot()
    }
}

#[async_trait]
impl OfflineServiceTrait for OfflineService {
    async fn enqueue_create(
        &self,
        entity_type: EntityType,
        payload: OfflinePayload,
    ) -> Result<OperationId, AppError> {
        self.queue
            .enqueue(entity_type, OperationType::Create, payload, None)
            .await
    }

    async fn enqueue_update(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
        payload: OfflinePayload,
    ) -> Result<OperationId, AppError> {
        self.queue
            .enqueue(entity_type, OperationType::Update, payload, Some(entity_id))
            .await
    }

    async fn enqueue_delete(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
    ) -> Result<OperationId, AppError> {
        self.queue
            .enqueue(
                entity_type,
                OperationType::Delete,
                OfflinePayload::empty(),
                Some(entity_id),
            )
            .await
    }

    async fn get_queue_stats(&self) -> Result<QueueStats, AppError> {
        self.queue.stats().await
    }

    async fn get_connectivity_status(&self) -> Result<ConnectivityStatus, AppError> {
        let stats = self.queue.stats().await?;
        Ok(ConnectivityStatus {
            is_online: self.connectivity.is_online(),
            is_syncing: self.engine.is_syncing(),
            last_sync_time: self.engine.last_sync_time().await,
            pending_operations: stats.pending,
            failed_operations: stats.failed,
        })
    }

    async fn force_sync(&self) -> Result<SyncReport, AppError> {
        if !self.connectivity.is_online() {
            return Err(AppError::Offline("cannot sync while offline".to_string()));
        }
        self.sync.force().await
    }

    async fn fetch_list(&self, entity_type: EntityType) -> Result<CachedFetch, AppError> {
        self.cache.fetch_list(entity_type).await
    }

    async fn pending_operations(&self) -> Result<Vec<QueuedOperation>, AppError> {
        self.queue.pending_operations().await
    }

    async fn dead_letters(&self) -> Result<Vec<DeadLetter>, AppError> {
        self.queue.dead_letters().await
    }

    async fn purge_dead_letters(&self) -> Result<u64, AppError> {
        self.queue.purge_dead_letters().await
    }
}
