use crate::domain::value_objects::OperationId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const EVENT_BUS_CAPACITY: usize = 256;

/// Notifications surfaced to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OfflineEvent {
    ConnectionRestored,
    ConnectionLost,
    SyncStarted,
    #[serde(rename_all = "camelCase")]
    SyncCompleted {
        synced: u32,
        failed: u32,
        dropped: Vec<OperationId>,
    },
    SyncFailed {
        error: String,
    },
}

impl OfflineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OfflineEvent::ConnectionRestored => "connectionRestored",
            OfflineEvent::ConnectionLost => "connectionLost",
            OfflineEvent::SyncStarted => "syncStarted",
            OfflineEvent::SyncCompleted { .. } => "syncCompleted",
            OfflineEvent::SyncFailed { .. } => "syncFailed",
        }
    }
}

/// Fan-out of `OfflineEvent`s. Subscribers that fall behind lose the oldest
/// events; emitting with nobody listening is not an error.
#[derive(Clone)]
pub struct OfflineEventBus {
    sender: broadcast::Sender<OfflineEvent>,
}

impl Default for OfflineEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl OfflineEventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { sender }
    }

    pub fn emit(&self, event: OfflineEvent) {
        tracing::debug!(target: "offline::sync", event = event.name(), "offline event");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OfflineEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
