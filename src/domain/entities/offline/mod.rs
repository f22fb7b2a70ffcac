pub mod cache_entry;
pub mod connectivity_status;
pub mod dead_letter;
pub mod local_record;
pub mod queue_stats;
pub mod queued_operation;
pub mod sync_report;

pub use cache_entry::CacheEntry;
pub use connectivity_status::ConnectivityStatus;
pub use dead_letter::{DeadLetter, DropReason};
pub use local_record::LocalRecord;
pub use queue_stats::QueueStats;
pub use queued_operation::{OperationDraft, QueuedOperation};
pub use sync_report::SyncReport;
