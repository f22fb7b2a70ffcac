use super::EntityType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of a read-through cache snapshot; one per entity type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_entity(entity_type: EntityType) -> Self {
        Self(entity_type.table_name().to_string())
    }

    pub fn new(value: String) -> Result<Self, String> {
        if value.trim().is_empty() {
            return Err("Cache key cannot be empty".to_string());
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EntityType> for CacheKey {
    fn from(value: EntityType) -> Self {
        Self::for_entity(value)
    }
}
