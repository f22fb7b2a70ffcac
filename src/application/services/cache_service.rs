use crate::application::ports::{OfflineQueueStore, RemoteStore};
use crate::application::services::connectivity_service::ConnectivityMonitor;
use crate::domain::entities::offline::{CacheEntry, LocalRecord};
use crate::domain::value_objects::{CacheKey, EntityId, EntityType, OperationType};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const NO_CACHE_ADVISORY: &str = "No cached data available offline";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Live,
    /// Served from the snapshot because the device is offline.
    Cache,
    /// Served from the snapshot because the live fetch failed.
    StaleCache,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedFetch {
    pub data: Vec<Value>,
    pub is_from_cache: bool,
    pub source: DataSource,
    pub last_updated: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl CachedFetch {
    fn live(data: Vec<Value>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            data,
            is_from_cache: false,
            source: DataSource::Live,
            last_updated: Some(fetched_at),
            error: None,
        }
    }
}

/// Serves reads from the remote store when possible and from the last
/// successful snapshot otherwise.
pub struct ReadThroughCache {
    store: Arc<dyn OfflineQueueStore>,
    remote: Arc<dyn RemoteStore>,
    connectivity: Arc<ConnectivityMonitor>,
    remote_timeout: Duration,
}

impl ReadThroughCache {
    pub fn new(
        store: Arc<dyn OfflineQueueStore>,
        remote: Arc<dyn RemoteStore>,
        connectivity: Arc<ConnectivityMonitor>,
        remote_timeout: Duration,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            remote_timeout,
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
        if !self.connectivity.is_online() {
            return self.from_snapshot(entity_type, DataSource::Cache, None).await;
        }

        match fetch().await {
            Ok(data) => {
                let fetched_at = Utc::now();
                let entry = CacheEntry::snapshot(entity_type, data, fetched_at);
                if let Err(err) = self.store.put_cache_entry(&entry).await {
                    tracing::warn!(
                        target: "offline::cache",
                        entity_type = %entity_type,
                        error = %err,
                        "failed to refresh snapshot; returning live data"
                    );
                } else {
                    tracing::debug!(
                        target: "offline::cache",
                        entity_type = %entity_type,
                        records = entry.data.len(),
                        size_bytes = entry.size,
                        "snapshot refreshed"
                    );
                }
                Ok(CachedFetch::live(entry.data, fetched_at))
            }
            Err(err) => {
                tracing::warn!(
                    target: "offline::cache",
                    entity_type = %entity_type,
                    error = %err,
                    "live fetch failed; falling back to snapshot"
                );
                self.from_snapshot(entity_type, DataSource::StaleCache, Some(err.to_string()))
                    .await
            }
        }
    }

    /// `fetch_with_cache` over `RemoteStore::list`.
    pub async fn fetch_list(&self, entity_type: EntityType) -> Result<CachedFetch, AppError> {
        let remote = Arc::clone(&self.remote);
        let limit = self.remote_timeout;
        self.fetch_with_cache(entity_type, move || async move {
            tokio::time::timeout(limit, remote.list(entity_type)).await?
        })
        .await
    }

    pub async fn cached(&self, entity_type: EntityType) -> Result<Option<CacheEntry>, AppError> {
        self.store
            .get_cache_entry(&CacheKey::for_entity(entity_type))
            .await
    }

    /// Overlays queued writes on `records` so the UI shows its own edits
    /// before they reach the server.
    pub async fn with_local_echo(
        &self,
        entity_type: EntityType,
        records: Vec<Value>,
    ) -> Result<Vec<LocalRecord>, AppError> {
        let mut merged: Vec<LocalRecord> = records
            .into_iter()
            .map(|record| LocalRecord::Confirmed { record })
            .collect();

        for operation in self.store.list_by_entity_type(entity_type).await? {
            match (operation.operation_type, operation.entity_id.as_ref()) {
                (OperationType::Create, _) => merged.push(LocalRecord::PendingLocal {
                    record: operation.payload.as_json().clone(),
                    operation_id: operation.id,
                }),
                (OperationType::Update, Some(entity_id)) => {
                    if let Some(slot) = merged
                        .iter_mut()
                        .find(|record| matches_id(record.record(), entity_id))
                    {
                        let record = overlay(slot.record(), operation.payload.as_json());
                        *slot = LocalRecord::PendingLocal {
                            record,
                            operation_id: operation.id,
                        };
                    }
                }
                (OperationType::Delete, Some(entity_id)) => {
                    merged.retain(|record| !matches_id(record.record(), entity_id));
                }
                (_, None) => {}
            }
        }

        Ok(merged)
    }

    async fn from_snapshot(
        &self,
        entity_type: EntityType,
        source: DataSource,
        error: Option<String>,
    ) -> Result<CachedFetch, AppError> {
        match self.cached(entity_type).await? {
            Some(entry) => Ok(CachedFetch {
                data: entry.data,
                is_from_cache: true,
                source,
                last_updated: Some(entry.last_updated),
                error,
            }),
            None => Ok(CachedFetch {
                data: Vec::new(),
                is_from_cache: true,
                source,
                last_updated: None,
                error: Some(NO_CACHE_ADVISORY.to_string()),
            }),
        }
    }
}

fn matches_id(record: &Value, entity_id: &EntityId) -> bool {
    match record.get("id") {
        Some(Value::String(id)) => id == entity_id.as_str(),
        Some(Value::Number(id)) => id.to_string() == entity_id.as_str(),
        _ => false,
    }
}

/// Shallow merge; `patch` fields win.
fn overlay(base: &Value, patch: &Value) -> Value {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            let mut merged = base.clone();
            for (key, value) in patch {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (_, patch) => patch.clone(),
    }
}
