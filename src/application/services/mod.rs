pub mod cache_service;
pub mod connectivity_service;
pub mod event_bus;
pub mod offline_service;
pub mod queue_service;
pub mod subscription_registry;
pub mod sync_coordinator;
pub mod sync_service;

pub use cache_service::{CachedFetch, DataSource, NO_CACHE_ADVISORY, ReadThroughCache};
pub use connectivity_service::ConnectivityMonitor;
pub use event_bus::{OfflineEvent, OfflineEventBus};
pub use offline_service::{OfflineService, OfflineServiceTrait};
pub use queue_service::{OperationQueue, QueueLimits};
pub use subscription_registry::SubscriptionRegistry;
pub use sync_coordinator::{SyncCoordinator, SyncHandle};
pub use sync_service::{OperationFailure, PassOutcome, SyncEngine, SyncSettings, SyncTrigger};
