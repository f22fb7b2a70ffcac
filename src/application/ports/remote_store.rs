use crate::domain::value_objects::{EntityId, EntityType};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteChange {
    pub entity_type: EntityType,
    pub kind: ChangeKind,
    pub record: Value,
}

pub type ChangeListener = Arc<dyn Fn(RemoteChange) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(String);

impl SubscriptionHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The backend the queue replays into.
///
/// Transport problems should surface as `AppError::Network` or
/// `AppError::Timeout`; a permanent validation failure as
/// `AppError::RemoteRejected` or `AppError::ValidationError`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn create(&self, entity_type: EntityType, payload: &Value) -> Result<Value, AppError>;
    async fn update(
        &self,
        entity_type: EntityType,
        entity_id: &EntityId,
        payload: &Value,
    ) -> Result<Value, AppError>;
    async fn delete(&self, entity_type: EntityType, entity_id: &EntityId) -> Result<(), AppError>;
    async fn list(&self, entity_type: EntityType) -> Result<Vec<Value>, AppError>;
    async fn subscribe(
        &self,
        entity_type: EntityType,
        on_change: ChangeListener,
    ) -> Result<SubscriptionHandle, AppError>;
    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<(), AppError>;
}
