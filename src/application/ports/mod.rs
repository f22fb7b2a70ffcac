pub mod offline_store;
pub mod reachability;
pub mod remote_store;

pub use offline_store::OfflineQueueStore;
pub use reachability::ReachabilityProbe;
pub use remote_store::{ChangeKind, ChangeListener, RemoteChange, RemoteStore, SubscriptionHandle};
