use super::rows::{CacheEntryRow, DeadLetterRow, OperationRow};
use crate::domain::entities::offline::{CacheEntry, DeadLetter, DropReason, QueuedOperation};
use crate::domain::value_objects::{
    CacheKey, EntityId, EntityType, OfflinePayload, OperationId, OperationStatus, OperationType,
};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::convert::TryInto;

pub fn domain_operation_from_row(row: OperationRow) -> Result<QueuedOperation, AppError> {
    let id = OperationId::new(row.id).map_err(AppError::ValidationError)?;
    let entity_type = parse_entity_type(&row.entity_type)?;
    let operation_type = row
        .operation_type
        .parse::<OperationType>()
        .map_err(AppError::ValidationError)?;
    let entity_id = row
        .entity_id
        .map(|id| EntityId::new(id).map_err(AppError::ValidationError))
        .transpose()?;
    let payload = payload_from_json(&row.payload)?;
    let timestamp = parse_rfc3339(&row.timestamp)
        .or_else(|| DateTime::<Utc>::from_timestamp_millis(row.timestamp_ms))
        .unwrap_or_else(Utc::now);

    Ok(QueuedOperation {
        id,
        entity_type,
        operation_type,
        entity_id,
        payload,
        timestamp,
        status: OperationStatus::from(row.status.as_str()),
        retry_count: try_i64_to_u32(row.retry_count, "retry_count")?,
        last_error: row.last_error,
    })
}

pub fn domain_cache_entry_from_row(row: CacheEntryRow) -> Result<CacheEntry, AppError> {
    let key = CacheKey::new(row.cache_key).map_err(AppError::ValidationError)?;
    let entity_type = parse_entity_type(&row.entity_type)?;
    let data: Vec<Value> = serde_json::from_str(&row.data)
        .map_err(|err| AppError::DeserializationError(err.to_string()))?;
    let last_updated = parse_rfc3339(&row.last_updated).unwrap_or_else(Utc::now);

    Ok(CacheEntry {
        key,
        entity_type,
        data,
        last_updated,
        size: try_i64_to_u64(row.size_bytes, "size_bytes")?,
    })
}

pub fn domain_dead_letter_from_row(row: DeadLetterRow) -> Result<DeadLetter, AppError> {
    let reason = DropReason::parse(&row.reason)
        .ok_or_else(|| AppError::ValidationError(format!("Unknown drop reason: {}", row.reason)))?;

    Ok(DeadLetter {
        operation_id: OperationId::new(row.operation_id).map_err(AppError::ValidationError)?,
        entity_type: parse_entity_type(&row.entity_type)?,
        operation_type: row
            .operation_type
            .parse::<OperationType>()
            .map_err(AppError::ValidationError)?,
        entity_id: row
            .entity_id
            .map(|id| EntityId::new(id).map_err(AppError::ValidationError))
            .transpose()?,
        payload: payload_from_json(&row.payload)?,
        retry_count: try_i64_to_u32(row.retry_count, "retry_count")?,
        last_error: row.last_error,
        reason,
        enqueued_at: parse_rfc3339(&row.enqueued_at).unwrap_or_else(Utc::now),
        dropped_at: timestamp_millis_to_datetime(row.dropped_at),
    })
}

pub fn payload_to_json(payload: &OfflinePayload) -> Result<String, AppError> {
    serde_json::to_string(payload.as_json())
        .map_err(|err| AppError::SerializationError(err.to_string()))
}

pub fn records_to_json(records: &[Value]) -> Result<String, AppError> {
    serde_json::to_string(records).map_err(|err| AppError::SerializationError(err.to_string()))
}

pub fn u64_to_i64(value: u64, label: &str) -> Result<i64, AppError> {
    value
        .try_into()
        .map_err(|_| AppError::ValidationError(format!("{label} exceeds storable range")))
}

pub fn try_i64_to_u64(value: i64, label: &str) -> Result<u64, AppError> {
    value
        .try_into()
        .map_err(|_| AppError::ValidationError(format!("{label} cannot be negative")))
}

fn try_i64_to_u32(value: i64, label: &str) -> Result<u32, AppError> {
    value
        .try_into()
        .map_err(|_| AppError::ValidationError(format!("{label} out of range")))
}

fn parse_entity_type(value: &str) -> Result<EntityType, AppError> {
    value.parse::<EntityType>().map_err(AppError::ValidationError)
}

fn payload_from_json(json: &str) -> Result<OfflinePayload, AppError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|err| AppError::DeserializationError(err.to_string()))?;
    OfflinePayload::new(value).map_err(AppError::ValidationError)
}

fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn timestamp_millis_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ts).unwrap_or_else(Utc::now)
}
