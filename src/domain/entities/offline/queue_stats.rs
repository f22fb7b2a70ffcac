use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub pending: u64,
    pub failed: u64,
    pub total_size: u64,
    pub is_near_limit: bool,
    pub total_operations: u64,
    pub max_queue_size: u64,
    pub max_storage_size: u64,
}
