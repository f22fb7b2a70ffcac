pub mod mappers;
pub mod metrics;
pub mod rows;
pub mod sqlite_store;

pub use metrics::{SyncMetrics, SyncMetricsSnapshot};
pub use sqlite_store::SqliteOfflineStore;
