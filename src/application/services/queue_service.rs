use crate::application::ports::OfflineQueueStore;
use crate::application::services::connectivity_service::ConnectivityMonitor;
use crate::application::services::sync_coordinator::SyncHandle;
use crate::application::services::sync_service::SyncTrigger;
use crate::domain::entities::offline::{DeadLetter, OperationDraft, QueueStats, QueuedOperation};
use crate::domain::value_objects::{
    EntityId, EntityType, OfflinePayload, OperationId, OperationStatus, OperationType,
};
use crate::shared::config::QueueConfig;
use crate::shared::error::AppError;
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct QueueLimits {
    pub max_queue_size: u64,
    pub max_storage_size: u64,
    pub near_limit_ratio: f64,
}

impl Default for QueueLimits {
    fn default() -> Self {
        Self::from(&QueueConfig::default())
    }
}

impl From<&QueueConfig> for QueueLimits {
    fn from(config: &QueueConfig) -> Self {
        Self {
            max_queue_size: config.max_queue_size,
            max_storage_size: config.max_storage_size,
            near_limit_ratio: config.near_limit_ratio,
        }
    }
}

impl QueueLimits {
    pub fn is_near_limit(&self, total_size: u64) -> bool {
        total_size as f64 > self.max_storage_size as f64 * self.near_limit_ratio
    }
}

/// Accepts writes made while offline and persists them for the sync engine.
pub struct OperationQueue {
    store: Arc<dyn OfflineQueueStore>,
    connectivity: Arc<ConnectivityMonitor>,
    limits: QueueLimits,
    sync: Option<SyncHandle>,
}

impl OperationQueue {
    pub fn new(
        store: Arc<dyn OfflineQueueStore>,
        connectivity: Arc<ConnectivityMonitor>,
        limits: QueueLimits,
    ) -> Self {
        Self {
            store,
            connectivity,
            limits,
            sync: None,
        }
    }

    /// Enqueues while online also nudge the coordinator.
    pub fn with_sync_trigger(mut self, handle: SyncHandle) -> Self {
        self.sync = Some(handle);
        self
    }

    pub async fn enqueue(
        &self,
        entity_type: EntityType,
        operation_type: OperationType,
        payload: OfflinePayload,
        entity_id: Option<EntityId>,
    ) -> Result<OperationId, AppError> {
        let draft = OperationDraft::new(entity_type, operation_type, payload, entity_id)
            .map_err(AppError::ValidationError)?;
        let operation = QueuedOperation::from_draft(draft, Utc::now());

        if let Err(err) = self
            .store
            .add_operation_bounded(&operation, self.limits.max_queue_size)
            .await
        {
            tracing::warn!(
                target: "offline::queue",
                entity_type = %entity_type,
                operation_type = %operation_type,
                error = %err,
                "enqueue rejected"
            );
            return Err(err);
        }

        tracing::info!(
            target: "offline::queue",
            operation_id = %operation.id,
            entity_type = %entity_type,
            operation_type = %operation_type,
            size_bytes = operation.size_bytes(),
            "operation queued"
        );

        if self.connectivity.is_online()
            && let Some(handle) = &self.sync
        {
            handle.request(SyncTrigger::Enqueue);
        }

        Ok(operation.id)
    }

    pub async fn stats(&self) -> Result<QueueStats, AppError> {
        let pending = self.store.count_by_status(&OperationStatus::Pending).await?;
        let failed_rows = self.store.count_by_status(&OperationStatus::Failed).await?;
        let dead_letters = self.store.count_dead_letters().await?;
        let total_size = self.store.total_operation_bytes().await?;
        let total_operations = self.store.count_operations().await?;

        Ok(QueueStats {
            pending,
            failed: dead_letters + failed_rows,
            total_size,
            is_near_limit: self.limits.is_near_limit(total_size),
            total_operations,
            max_queue_size: self.limits.max_queue_size,
            max_storage_size: self.limits.max_storage_size,
        })
    }

    /// Every queued operation in replay order.
    pub async fn pending_operations(&self) -> Result<Vec<QueuedOperation>, AppError> {
        self.store.list_operations().await
    }

    pub async fn operations_for(
        &self,
        entity_type: EntityType,
    ) -> Result<Vec<QueuedOperation>, AppError> {
        self.store.list_by_entity_type(entity_type).await
    }

    pub async fn dead_letters(&self) -> Result<Vec<DeadLetter>, AppError> {
        self.store.list_dead_letters().await
    }

    pub async fn purge_dead_letters(&self) -> Result<u64, AppError> {
        let purged = self.store.purge_dead_letters().await?;
        tracing::info!(target: "offline::queue", purged, "dead letters purged");
        Ok(purged)
    }
}
