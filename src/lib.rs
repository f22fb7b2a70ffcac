//! Offline operation queue and reconciliation engine for the barangay records
//! app: writes made without connectivity are persisted locally and replayed
//! against the remote store once the device is back online.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod runtime;
pub mod shared;

pub use application::ports::{
    ChangeKind, ChangeListener, OfflineQueueStore, ReachabilityProbe, RemoteChange, RemoteStore,
    SubscriptionHandle,
};
pub use application::services::{
    CachedFetch, DataSource, OfflineEvent, OfflineService, OfflineServiceTrait, SyncTrigger,
};
pub use domain::entities::offline::{
    ConnectivityStatus, DeadLetter, DropReason, LocalRecord, QueueStats, QueuedOperation,
    SyncReport,
};
pub use domain::value_objects::{EntityId, EntityType, OfflinePayload, OperationId, OperationType};
pub use runtime::{OfflineRuntime, OfflineRuntimeBuilder};
pub use shared::{AppConfig, AppError, Result};

/// Installs a `tracing` subscriber filtered by `RUST_LOG`. Safe to call more
/// than once; later calls are ignored.
pub fn init_logging() {
    init_logging_with("barangay_offline=debug,info");
}

pub fn init_logging_with(default_filter: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
