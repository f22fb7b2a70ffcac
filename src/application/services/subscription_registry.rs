use crate::application::ports::{ChangeListener, RemoteStore, SubscriptionHandle};
use crate::domain::value_objects::EntityType;
use crate::shared::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tracks live remote subscriptions so they can be torn down together.
pub struct SubscriptionRegistry {
    remote: Arc<dyn RemoteStore>,
    handles: Mutex<HashMap<SubscriptionHandle, EntityType>>,
}

impl SubscriptionRegistry {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            remote,
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub async fn subscribe(
        &self,
        entity_type: EntityType,
        on_change: ChangeListener,
    ) -> Result<SubscriptionHandle, AppError> {
        let handle = self.remote.subscribe(entity_type, on_change).await?;
        self.handles
            .lock()
            .await
            .insert(handle.clone(), entity_type);
        tracing::debug!(
            target: "offline::sync",
            entity_type = %entity_type,
            handle = %handle,
            "remote subscription registered"
        );
        Ok(handle)
    }

    /// Unknown handles are ignored.
    pub async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<(), AppError> {
        if self.handles.lock().await.remove(handle).is_none() {
            return Ok(());
        }
        self.remote.unsubscribe(handle).await
    }

    pub async fn active(&self) -> usize {
        self.handles.lock().await.len()
    }

    pub async fn active_for(&self, entity_type: EntityType) -> usize {
        self.handles
            .lock()
            .await
            .values()
            .filter(|registered| **registered == entity_type)
            .count()
    }

    /// Best effort: a failing unsubscribe is logged and the rest continue.
    pub async fn unsubscribe_all(&self) -> usize {
        let drained: Vec<SubscriptionHandle> =
            self.handles.lock().await.drain().map(|(handle, _)| handle).collect();

        let mut released = 0;
        for handle in drained {
            match self.remote.unsubscribe(&handle).await {
                Ok(()) => released += 1,
                Err(err) => {
                    tracing::warn!(
                        target: "offline::sync",
                        handle = %handle,
                        error = %err,
                        "failed to release remote subscription"
                    );
                }
            }
        }
        released
    }
}
