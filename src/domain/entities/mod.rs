pub mod offline;

pub use offline::{
    CacheEntry, ConnectivityStatus, DeadLetter, DropReason, LocalRecord, OperationDraft,
    QueueStats, QueuedOperation, SyncReport,
};
