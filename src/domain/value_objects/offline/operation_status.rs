use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a queued operation. Synced operations are deleted, so there is
/// no terminal success state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Pending,
    Syncing,
    Failed,
    Unknown(String),
}

impl OperationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Syncing => "syncing",
            OperationStatus::Failed => "failed",
            OperationStatus::Unknown(value) => value.as_str(),
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for OperationStatus {
    fn from(value: &str) -> Self {
        match value {
            "pending" => OperationStatus::Pending,
            "syncing" => OperationStatus::Syncing,
            "failed" => OperationStatus::Failed,
            other => OperationStatus::Unknown(other.to_string()),
        }
    }
}
