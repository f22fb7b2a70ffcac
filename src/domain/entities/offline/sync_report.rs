use crate::domain::value_objects::OperationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one sync pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub synced: u32,
    /// Failed attempts in this pass, whether retained for retry or dropped.
    pub failed: u32,
    pub dropped: Vec<OperationId>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn empty(at: DateTime<Utc>) -> Self {
        Self {
            synced: 0,
            failed: 0,
            dropped: Vec::new(),
            started_at: at,
            finished_at: at,
        }
    }

    pub fn attempted(&self) -> u32 {
        self.synced + self.failed
    }

    pub fn duration_ms(&self) -> u64 {
        self.finished_at
            .signed_duration_since(self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }
}
