use super::OperationType;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Domain record kinds the offline queue knows how to replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Document,
    Incident,
    Resident,
    Announcement,
    Transaction,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        EntityType::Document,
        EntityType::Incident,
        EntityType::Resident,
        EntityType::Announcement,
        EntityType::Transaction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Document => "document",
            EntityType::Incident => "incident",
            EntityType::Resident => "resident",
            EntityType::Announcement => "announcement",
            EntityType::Transaction => "transaction",
        }
    }

    /// Logical remote table backing this entity type.
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityType::Document => "documents",
            EntityType::Incident => "incidents",
            EntityType::Resident => "residents",
            EntityType::Announcement => "announcements",
            EntityType::Transaction => "transactions",
        }
    }

    /// Document requests, incident reports and financial transactions are
    /// append-and-amend records; only residents and announcements can be removed.
    pub fn supports(&self, operation: OperationType) -> bool {
        match operation {
            OperationType::Create | OperationType::Update => true,
            OperationType::Delete => {
                matches!(self, EntityType::Resident | EntityType::Announcement)
            }
        }
    }

    fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" | "documents" => Ok(EntityType::Document),
            "incident" | "incidents" => Ok(EntityType::Incident),
            "resident" | "residents" => Ok(EntityType::Resident),
            "announcement" | "announcements" => Ok(EntityType::Announcement),
            "transaction" | "transactions" => Ok(EntityType::Transaction),
            "" => Err("Entity type cannot be empty".to_string()),
            other => Err(format!("Unknown entity type: {other}")),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
