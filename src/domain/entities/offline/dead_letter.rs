use crate::domain::entities::offline::QueuedOperation;
use crate::domain::value_objects::{
    EntityId, EntityType, OfflinePayload, OperationId, OperationType,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    RetriesExhausted,
    UnsupportedOperation,
    PermanentRejection,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::RetriesExhausted => "retries_exhausted",
            DropReason::UnsupportedOperation => "unsupported_operation",
            DropReason::PermanentRejection => "permanent_rejection",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "retries_exhausted" => Some(DropReason::RetriesExhausted),
            "unsupported_operation" => Some(DropReason::UnsupportedOperation),
            "permanent_rejection" => Some(DropReason::PermanentRejection),
            _ => None,
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation the sync engine gave up on, kept with its payload so it can
/// be inspected or re-entered by hand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    pub operation_id: OperationId,
    pub entity_type: EntityType,
    pub operation_type: OperationType,
    pub entity_id: Option<EntityId>,
    pub payload: OfflinePayload,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub reason: DropReason,
    pub enqueued_at: DateTime<Utc>,
    pub dropped_at: DateTime<Utc>,
}

impl DeadLetter {
    pub fn from_operation(
        operation: &QueuedOperation,
        reason: DropReason,
        dropped_at: DateTime<Utc>,
    ) -> Self {
        Self {
            operation_id: operation.id.clone(),
            entity_type: operation.entity_type,
            operation_type: operation.operation_type,
            entity_id: operation.entity_id.clone(),
            payload: operation.payload.clone(),
            retry_count: operation.retry_count,
            last_error: operation.last_error.clone(),
            reason,
            enqueued_at: operation.timestamp,
            dropped_at,
        }
    }
}
