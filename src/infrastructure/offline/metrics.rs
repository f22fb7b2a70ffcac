use crate::domain::entities::offline::SyncReport;
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcomeStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetricsSnapshot {
    pub total_passes: u64,
    pub failed_passes: u64,
    pub consecutive_failed_passes: u64,
    pub operations_synced: u64,
    pub operations_failed: u64,
    pub operations_dropped: u64,
    pub last_success_ms: Option<u64>,
    pub last_failure_ms: Option<u64>,
    pub last_outcome: Option<PassOutcomeStatus>,
    pub last_trigger: Option<String>,
    pub last_error: Option<String>,
    pub last_duration_ms: Option<u64>,
    pub last_synced_count: Option<u32>,
    pub last_failed_count: Option<u32>,
}

#[derive(Default, Clone)]
struct LastPassMetadata {
    outcome: Option<PassOutcomeStatus>,
    trigger: Option<String>,
    error: Option<String>,
    duration_ms: Option<u64>,
    synced: Option<u32>,
    failed: Option<u32>,
}

/// Process-local counters for sync passes. Cheap to share behind an `Arc`.
pub struct SyncMetrics {
    passes: AtomicU64,
    failed_passes: AtomicU64,
    consecutive_failed: AtomicU64,
    synced: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    last_success_ms: AtomicU64,
    last_failure_ms: AtomicU64,
    metadata: Mutex<LastPassMetadata>,
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            passes: AtomicU64::new(0),
            failed_passes: AtomicU64::new(0),
            consecutive_failed: AtomicU64::new(0),
            synced: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            last_success_ms: AtomicU64::new(0),
            last_failure_ms: AtomicU64::new(0),
            metadata: Mutex::new(LastPassMetadata::default()),
        }
    }

    /// A pass that ran to the end, even if individual operations failed.
    pub fn record_pass(&self, report: &SyncReport, trigger: &str) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.synced
            .fetch_add(u64::from(report.synced), Ordering::Relaxed);
        self.failed
            .fetch_add(u64::from(report.failed), Ordering::Relaxed);
        self.dropped
            .fetch_add(report.dropped.len() as u64, Ordering::Relaxed);
        self.last_success_ms
            .store(current_unix_ms(), Ordering::Relaxed);
        self.consecutive_failed.store(0, Ordering::Relaxed);

        if let Ok(mut guard) = self.metadata.lock() {
            guard.outcome = Some(PassOutcomeStatus::Success);
            guard.trigger = Some(trigger.to_string());
            guard.error = None;
            guard.duration_ms = Some(report.duration_ms());
            guard.synced = Some(report.synced);
            guard.failed = Some(report.failed);
        }
    }

    /// A pass aborted by a storage error.
    pub fn record_failed_pass(&self, trigger: &str, error: &str) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.failed_passes.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failed.fetch_add(1, Ordering::Relaxed);
        self.last_failure_ms
            .store(current_unix_ms(), Ordering::Relaxed);

        if let Ok(mut guard) = self.metadata.lock() {
            guard.outcome = Some(PassOutcomeStatus::Failure);
            guard.trigger = Some(trigger.to_string());
            guard.error = Some(error.to_string());
            guard.duration_ms = None;
            guard.synced = None;
            guard.failed = None;
        }
    }

    pub fn snapshot(&self) -> SyncMetricsSnapshot {
        let metadata = self
            .metadata
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();

        SyncMetricsSnapshot {
            total_passes: self.passes.load(Ordering::Relaxed),
            failed_passes: self.failed_passes.load(Ordering::Relaxed),
            consecutive_failed_passes: self.consecutive_failed.load(Ordering::Relaxed),
            operations_synced: self.synced.load(Ordering::Relaxed),
            operations_failed: self.failed.load(Ordering::Relaxed),
            operations_dropped: self.dropped.load(Ordering::Relaxed),
            last_success_ms: to_option(self.last_success_ms.load(Ordering::Relaxed)),
            last_failure_ms: to_option(self.last_failure_ms.load(Ordering::Relaxed)),
            last_outcome: metadata.outcome,
            last_trigger: metadata.trigger,
            last_error: metadata.error,
            last_duration_ms: metadata.duration_ms,
            last_synced_count: metadata.synced,
            last_failed_count: metadata.failed,
        }
    }
}

fn to_option(value: u64) -> Option<u64> {
    if value == 0 { None } else { Some(value) }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}
