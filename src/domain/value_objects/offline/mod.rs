pub mod cache_key;
pub mod entity_id;
pub mod entity_type;
pub mod operation_id;
pub mod operation_status;
pub mod operation_type;
pub mod payload;

pub use cache_key::CacheKey;
pub use entity_id::EntityId;
pub use entity_type::EntityType;
pub use operation_id::OperationId;
pub use operation_status::OperationStatus;
pub use operation_type::OperationType;
pub use payload::OfflinePayload;
