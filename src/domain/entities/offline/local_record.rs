use crate::domain::value_objects::OperationId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A row as shown to consumers: either confirmed by the remote store or a
/// local echo of a queued write that has not synced yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocalRecord {
    Confirmed {
        record: Value,
    },
    PendingLocal {
        record: Value,
        operation_id: OperationId,
    },
}

impl LocalRecord {
    pub fn record(&self) -> &Value {
        match self {
            LocalRecord::Confirmed { record } | LocalRecord::PendingLocal { record, .. } => record,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, LocalRecord::PendingLocal { .. })
    }

    pub fn pending_operation(&self) -> Option<&OperationId> {
        match self {
            LocalRecord::PendingLocal { operation_id, .. } => Some(operation_id),
            LocalRecord::Confirmed { .. } => None,
        }
    }
}
