use crate::domain::entities::offline::{CacheEntry, DeadLetter, QueuedOperation};
use crate::domain::value_objects::{CacheKey, EntityType, OperationId, OperationStatus};
use crate::shared::error::AppError;
use async_trait::async_trait;

pub const LAST_SYNC_TIME_KEY: &str = "last_sync_time";
pub const LAST_SYNC_REPORT_KEY: &str = "last_sync_report";

/// Durable storage for queued operations, cache snapshots and sync bookkeeping.
///
/// Every method is atomic per record. Multi-row reads of operations come back
/// in FIFO order (enqueue timestamp, then insertion order).
#[async_trait]
pub trait OfflineQueueStore: Send + Sync {
    /// Fails with `DuplicateKey` when the id is already stored.
    async fn add_operation(&self, operation: &QueuedOperation) -> Result<(), AppError>;
    /// Count-and-insert in one transaction; fails with `QueueFull` at the limit.
    async fn add_operation_bounded(
        &self,
        operation: &QueuedOperation,
        max_queue_size: u64,
    ) -> Result<(), AppError>;
    async fn get_operation(&self, id: &OperationId) -> Result<Option<QueuedOperation>, AppError>;
    async fn list_operations(&self) -> Result<Vec<QueuedOperation>, AppError>;
    async fn list_by_status(
        &self,
        status: &OperationStatus,
    ) -> Result<Vec<QueuedOperation>, AppError>;
    async fn list_by_entity_type(
        &self,
        entity_type: EntityType,
    ) -> Result<Vec<QueuedOperation>, AppError>;
    /// Full replace by id; fails with `NotFound` when absent.
    async fn update_operation(&self, operation: &QueuedOperation) -> Result<(), AppError>;
    /// Idempotent.
    async fn delete_operation(&self, id: &OperationId) -> Result<(), AppError>;
    async fn count_operations(&self) -> Result<u64, AppError>;
    async fn count_by_status(&self, status: &OperationStatus) -> Result<u64, AppError>;
    async fn total_operation_bytes(&self) -> Result<u64, AppError>;
    /// Puts rows stranded in `syncing` or `failed` back to `pending`.
    async fn recover_interrupted(&self) -> Result<u64, AppError>;

    async fn put_cache_entry(&self, entry: &CacheEntry) -> Result<(), AppError>;
    async fn get_cache_entry(&self, key: &CacheKey) -> Result<Option<CacheEntry>, AppError>;

    /// Deletes the operation and stores the dead letter in one transaction.
    async fn move_to_dead_letters(&self, letter: &DeadLetter) -> Result<(), AppError>;
    async fn list_dead_letters(&self) -> Result<Vec<DeadLetter>, AppError>;
    async fn count_dead_letters(&self) -> Result<u64, AppError>;
    async fn purge_dead_letters(&self) -> Result<u64, AppError>;

    async fn get_sync_metadata(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn put_sync_metadata(&self, key: &str, value: &str) -> Result<(), AppError>;
}
