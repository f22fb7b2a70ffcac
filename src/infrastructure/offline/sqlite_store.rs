use super::mappers::{
    domain_cache_entry_from_row, domain_dead_letter_from_row, domain_operation_from_row,
    payload_to_json, records_to_json, try_i64_to_u64, u64_to_i64,
};
use super::rows::{CacheEntryRow, DeadLetterRow, OperationRow};
use crate::application::ports::offline_store::OfflineQueueStore;
use crate::domain::entities::offline::{CacheEntry, DeadLetter, QueuedOperation};
use crate::domain::value_objects::{CacheKey, EntityType, OperationId, OperationStatus};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::{Executor, Pool, Sqlite};

const OPERATION_COLUMNS: &str = "seq, id, entity_type, operation_type, entity_id, payload, \
     timestamp, timestamp_ms, status, retry_count, last_error, size_bytes";

const FIFO_ORDER: &str = "ORDER BY timestamp_ms ASC, seq ASC";

/// `OfflineQueueStore` backed by the app's SQLite database.
#[derive(Clone)]
pub struct SqliteOfflineStore {
    pool: Pool<Sqlite>,
}

impl SqliteOfflineStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn insert_operation<'e, E>(executor: E, operation: &QueuedOperation) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let payload = payload_to_json(&operation.payload)?;
        let size_bytes = u64_to_i64(operation.size_bytes(), "size_bytes")?;

        sqlx::query(
            r#"
            INSERT INTO operations (
                id, entity_type, operation_type, entity_id, payload,
                timestamp, timestamp_ms, status, retry_count, last_error, size_bytes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(operation.id.as_str())
        .bind(operation.entity_type.as_str())
        .bind(operation.operation_type.as_str())
        .bind(operation.entity_id.as_ref().map(|id| id.as_str()))
        .bind(payload)
        .bind(
            operation
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        )
        .bind(operation.timestamp.timestamp_millis())
        .bind(operation.status.as_str())
        .bind(i64::from(operation.retry_count))
        .bind(operation.last_error.as_deref())
        .bind(size_bytes)
        .execute(executor)
        .await
        .map_err(|err| match AppError::from(err) {
            AppError::DuplicateKey(_) => {
                AppError::DuplicateKey(format!("operation {} is already queued", operation.id))
            }
            other => other,
        })?;

        Ok(())
    }

    async fn fetch_operations(
        &self,
        filter: &str,
        bind: Option<&str>,
    ) -> Result<Vec<QueuedOperation>, AppError> {
        let sql = format!("SELECT {OPERATION_COLUMNS} FROM operations {filter} {FIFO_ORDER}");
        let mut query = sqlx::query_as::<_, OperationRow>(&sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;

        rows.into_iter().map(domain_operation_from_row).collect()
    }

    async fn count_where(&self, sql: &str, bind: Option<&str>) -> Result<u64, AppError> {
        let mut query = sqlx::query_as::<_, (i64,)>(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let (count,) = query.fetch_one(&self.pool).await?;
        try_i64_to_u64(count, "count")
    }
}

#[async_trait]
impl OfflineQueueStore for SqliteOfflineStore {
    async fn add_operation(&self, operation: &QueuedOperation) -> Result<(), AppError> {
        Self::insert_operation(&self.pool, operation).await
    }

    async fn add_operation_bounded(
        &self,
        operation: &QueuedOperation,
        max_queue_size: u64,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM operations")
            .fetch_one(&mut *tx)
            .await?;
        let count = try_i64_to_u64(count, "count")?;
        if count >= max_queue_size {
            tx.rollback().await?;
            return Err(AppError::QueueFull(format!(
                "{count} operations queued (limit {max_queue_size}); sync before adding more"
            )));
        }

        Self::insert_operation(&mut *tx, operation).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_operation(&self, id: &OperationId) -> Result<Option<QueuedOperation>, AppError> {
        let sql = format!("SELECT {OPERATION_COLUMNS} FROM operations WHERE id = ?1");
        let row = sqlx::query_as::<_, OperationRow>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(domain_operation_from_row).transpose()
    }

    async fn list_operations(&self) -> Result<Vec<QueuedOperation>, AppError> {
        self.fetch_operations("", None).await
    }

    async fn list_by_status(
        &self,
        status: &OperationStatus,
    ) -> Result<Vec<QueuedOperation>, AppError> {
        self.fetch_operations("WHERE status = ?1", Some(status.as_str()))
            .await
    }

    async fn list_by_entity_type(
        &self,
        entity_type: EntityType,
    ) -> Result<Vec<QueuedOperation>, AppError> {
        self.fetch_operations("WHERE entity_type = ?1", Some(entity_type.as_str()))
            .await
    }

    async fn update_operation(&self, operation: &QueuedOperation) -> Result<(), AppError> {
        let payload = payload_to_json(&operation.payload)?;
        let size_bytes = u64_to_i64(operation.size_bytes(), "size_bytes")?;

        let result = sqlx::query(
            r#"
            UPDATE operations
            SET entity_type = ?1,
                operation_type = ?2,
                entity_id = ?3,
                payload = ?4,
                timestamp = ?5,
                timestamp_ms = ?6,
                status = ?7,
                retry_count = ?8,
                last_error = ?9,
                size_bytes = ?10
            WHERE id = ?11
            "#,
        )
        .bind(operation.entity_type.as_str())
        .bind(operation.operation_type.as_str())
        .bind(operation.entity_id.as_ref().map(|id| id.as_str()))
        .bind(payload)
        .bind(
            operation
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        )
        .bind(operation.timestamp.timestamp_millis())
        .bind(operation.status.as_str())
        .bind(i64::from(operation.retry_count))
        .bind(operation.last_error.as_deref())
        .bind(size_bytes)
        .bind(operation.id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("operation {}", operation.id)));
        }
        Ok(())
    }

    async fn delete_operation(&self, id: &OperationId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM operations WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_operations(&self) -> Result<u64, AppError> {
        self.count_where("SELECT COUNT(*) FROM operations", None)
            .await
    }

    async fn count_by_status(&self, status: &OperationStatus) -> Result<u64, AppError> {
        self.count_where(
            "SELECT COUNT(*) FROM operations WHERE status = ?1",
            Some(status.as_str()),
        )
        .await
    }

    async fn total_operation_bytes(&self) -> Result<u64, AppError> {
        self.count_where(
            "SELECT CAST(COALESCE(SUM(size_bytes), 0) AS INTEGER) FROM operations",
            None,
        )
        .await
    }

    async fn recover_interrupted(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE operations
            SET status = 'pending'
            WHERE status IN ('syncing', 'failed')
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn put_cache_entry(&self, entry: &CacheEntry) -> Result<(), AppError> {
        let data = records_to_json(&entry.data)?;

        sqlx::query(
            r#"
            INSERT INTO cached_data (cache_key, entity_type, data, last_updated, size_bytes)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(cache_key) DO UPDATE SET
                entity_type = excluded.entity_type,
                data = excluded.data,
                last_updated = excluded.last_updated,
                size_bytes = excluded.size_bytes
            "#,
        )
        .bind(entry.key.as_str())
        .bind(entry.entity_type.as_str())
        .bind(data)
        .bind(entry.last_updated.to_rfc3339_opts(SecondsFormat::Millis, true))
        .bind(u64_to_i64(entry.size, "size")?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_cache_entry(&self, key: &CacheKey) -> Result<Option<CacheEntry>, AppError> {
        let row = sqlx::query_as::<_, CacheEntryRow>(
            r#"
            SELECT cache_key, entity_type, data, last_updated, size_bytes
            FROM cached_data
            WHERE cache_key = ?1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(domain_cache_entry_from_row).transpose()
    }

    async fn move_to_dead_letters(&self, letter: &DeadLetter) -> Result<(), AppError> {
        let payload = payload_to_json(&letter.payload)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO dead_letters (
                operation_id, entity_type, operation_type, entity_id, payload,
                retry_count, last_error, reason, enqueued_at, dropped_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(letter.operation_id.as_str())
        .bind(letter.entity_type.as_str())
        .bind(letter.operation_type.as_str())
        .bind(letter.entity_id.as_ref().map(|id| id.as_str()))
        .bind(payload)
        .bind(i64::from(letter.retry_count))
        .bind(letter.last_error.as_deref())
        .bind(letter.reason.as_str())
        .bind(
            letter
                .enqueued_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        )
        .bind(letter.dropped_at.timestamp_millis())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM operations WHERE id = ?1")
            .bind(letter.operation_id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_dead_letters(&self) -> Result<Vec<DeadLetter>, AppError> {
        let rows = sqlx::query_as::<_, DeadLetterRow>(
            r#"
            SELECT seq, operation_id, entity_type, operation_type, entity_id, payload,
                   retry_count, last_error, reason, enqueued_at, dropped_at
            FROM dead_letters
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(domain_dead_letter_from_row).collect()
    }

    async fn count_dead_letters(&self) -> Result<u64, AppError> {
        self.count_where("SELECT COUNT(*) FROM dead_letters", None)
            .await
    }

    async fn purge_dead_letters(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM dead_letters")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn get_sync_metadata(&self, key: &str) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT meta_value FROM sync_metadata WHERE meta_key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn put_sync_metadata(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sync_metadata (meta_key, meta_value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(meta_key) DO UPDATE SET
                meta_value = excluded.meta_value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
