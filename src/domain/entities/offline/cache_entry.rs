use crate::domain::value_objects::{CacheKey, EntityType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Last known-good list of records for one entity type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: CacheKey,
    pub entity_type: EntityType,
    pub data: Vec<Value>,
    pub last_updated: DateTime<Utc>,
    pub size: u64,
}

impl CacheEntry {
    pub fn snapshot(entity_type: EntityType, data: Vec<Value>, last_updated: DateTime<Utc>) -> Self {
        let size = serde_json::to_vec(&data)
            .map(|bytes| bytes.len() as u64)
            .unwrap_or(0);
        Self {
            key: CacheKey::for_entity(entity_type),
            entity_type,
            data,
            last_updated,
            size,
        }
    }
}
