pub mod offline;

pub use offline::{
    CacheKey, EntityId, EntityType, OfflinePayload, OperationId, OperationStatus, OperationType,
};
