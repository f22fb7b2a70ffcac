use crate::domain::value_objects::{
    EntityId, EntityType, OfflinePayload, OperationId, OperationStatus, OperationType,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A validated write request that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDraft {
    pub entity_type: EntityType,
    pub operation_type: OperationType,
    pub entity_id: Option<EntityId>,
    pub payload: OfflinePayload,
}

impl OperationDraft {
    /// Update and delete need the target id; a create never carries one.
    pub fn new(
        entity_type: EntityType,
        operation_type: OperationType,
        payload: OfflinePayload,
        entity_id: Option<EntityId>,
    ) -> Result<Self, String> {
        let entity_id = match operation_type {
            OperationType::Create => None,
            OperationType::Update | OperationType::Delete => match entity_id {
                Some(id) => Some(id),
                None => {
                    return Err(format!(
                        "{} of {} requires an entity id",
                        operation_type, entity_type
                    ));
                }
            },
        };

        Ok(Self {
            entity_type,
            operation_type,
            entity_id,
            payload,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueuedOperation {
    pub id: OperationId,
    pub entity_type: EntityType,
    pub operation_type: OperationType,
    pub entity_id: Option<EntityId>,
    pub payload: OfflinePayload,
    pub timestamp: DateTime<Utc>,
    pub status: OperationStatus,
    pub retry_count: u32,
    pub last_error: Option<String>,
}

impl QueuedOperation {
    pub fn from_draft(draft: OperationDraft, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: OperationId::generate(),
            entity_type: draft.entity_type,
            operation_type: draft.operation_type,
            entity_id: draft.entity_id,
            payload: draft.payload,
            timestamp,
            status: OperationStatus::Pending,
            retry_count: 0,
            last_error: None,
        }
    }

    /// Serialized length used for storage accounting.
    pub fn size_bytes(&self) -> u64 {
        serde_json::to_vec(self)
            .map(|bytes| bytes.len() as u64)
            .unwrap_or(0)
    }

    pub fn is_pending(&self) -> bool {
        self.status == OperationStatus::Pending
    }

    pub fn mark_syncing(&mut self) {
        self.status = OperationStatus::Syncing;
    }

    pub fn mark_pending(&mut self) {
        self.status = OperationStatus::Pending;
    }

    /// Records a failed attempt. Returns true once the retry budget is spent.
    pub fn record_failure(&mut self, error: impl Into<String>, max_retries: u32) -> bool {
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_error = Some(error.into());
        self.status = OperationStatus::Pending;
        self.retry_count >= max_retries
    }
}
