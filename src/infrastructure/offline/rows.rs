use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OperationRow {
    pub seq: i64,
    pub id: String,
    pub entity_type: String,
    pub operation_type: String,
    pub entity_id: Option<String>,
    pub payload: String,
    pub timestamp: String,
    pub timestamp_ms: i64,
    pub status: String,
    pub retry_count: i64,
    pub last_error: Option<String>,
    pub size_bytes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CacheEntryRow {
    pub cache_key: String,
    pub entity_type: String,
    pub data: String,
    pub last_updated: String,
    pub size_bytes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeadLetterRow {
    pub seq: i64,
    pub operation_id: String,
    pub entity_type: String,
    pub operation_type: String,
    pub entity_id: Option<String>,
    pub payload: String,
    pub retry_count: i64,
    pub last_error: Option<String>,
    pub reason: String,
    pub enqueued_at: String,
    pub dropped_at: i64,
}
