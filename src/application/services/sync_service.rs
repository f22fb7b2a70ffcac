use crate::application::ports::offline_store::{LAST_SYNC_REPORT_KEY, LAST_SYNC_TIME_KEY};
use crate::application::ports::{OfflineQueueStore, RemoteStore};
use crate::application::services::connectivity_service::ConnectivityMonitor;
use crate::application::services::event_bus::{OfflineEvent, OfflineEventBus};
use crate::domain::entities::offline::{DeadLetter, DropReason, QueuedOperation, SyncReport};
use crate::domain::value_objects::{OperationStatus, OperationType};
use crate::infrastructure::offline::SyncMetrics;
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub max_retries: u32,
    pub batch_size: usize,
    pub batch_pause: Duration,
    pub remote_timeout: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            batch_size: (config.batch_size.max(1)) as usize,
            batch_pause: config.batch_pause(),
            remote_timeout: config.remote_timeout(),
        }
    }
}

/// Why a pass was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    Enqueue,
    ConnectionRestored,
    Periodic,
    Manual,
    Startup,
}

impl SyncTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTrigger::Enqueue => "enqueue",
            SyncTrigger::ConnectionRestored => "connection_restored",
            SyncTrigger::Periodic => "periodic",
            SyncTrigger::Manual => "manual",
            SyncTrigger::Startup => "startup",
        }
    }
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    Completed(SyncReport),
    SkippedOffline,
    SkippedBusy,
}

/// Result of replaying a single operation against the remote store.
#[derive(Debug, Error)]
pub enum OperationFailure {
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    #[error("rejected by remote store: {0}")]
    Permanent(AppError),
    #[error("{0}")]
    Transient(AppError),
    #[error("remote call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl OperationFailure {
    fn from_remote(err: AppError) -> Self {
        match err {
            AppError::UnsupportedOperation(msg) => OperationFailure::Unsupported(msg),
            err if err.is_retryable() => OperationFailure::Transient(err),
            err => OperationFailure::Permanent(err),
        }
    }

    /// Permanent failures skip the retry budget.
    pub fn drop_reason(&self) -> Option<DropReason> {
        match self {
            OperationFailure::Unsupported(_) => Some(DropReason::UnsupportedOperation),
            OperationFailure::Permanent(_) => Some(DropReason::PermanentRejection),
            OperationFailure::Transient(_) | OperationFailure::Timeout(_) => None,
        }
    }
}

struct SyncingGuard<'a>(&'a AtomicBool);

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Replays pending operations against the remote store, oldest first.
pub struct SyncEngine {
    store: Arc<dyn OfflineQueueStore>,
    remote: Arc<dyn RemoteStore>,
    connectivity: Arc<ConnectivityMonitor>,
    events: OfflineEventBus,
    metrics: Arc<SyncMetrics>,
    settings: SyncSettings,
    is_syncing: AtomicBool,
    last_sync: RwLock<Option<DateTime<Utc>>>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn OfflineQueueStore>,
        remote: Arc<dyn RemoteStore>,
        connectivity: Arc<ConnectivityMonitor>,
        events: OfflineEventBus,
        metrics: Arc<SyncMetrics>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            events,
            metrics,
            settings,
            is_syncing: AtomicBool::new(false),
            last_sync: RwLock::new(None),
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.is_syncing.load(Ordering::Acquire)
    }

    pub async fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        *self.last_sync.read().await
    }

    pub fn metrics(&self) -> &Arc<SyncMetrics> {
        &self.metrics
    }

    /// Loads the persisted last sync time so status survives restarts.
    pub async fn restore_state(&self) -> Result<(), AppError> {
        let stored = self.store.get_sync_metadata(LAST_SYNC_TIME_KEY).await?;
        if let Some(value) = stored
            && let Ok(parsed) = DateTime::parse_from_rfc3339(&value)
        {
            *self.last_sync.write().await = Some(parsed.with_timezone(&Utc));
        }
        Ok(())
    }

    /// Runs one pass. Returns immediately when offline or when another pass
    /// holds the engine.
    pub async fn run_pass(&self, trigger: SyncTrigger) -> Result<PassOutcome, AppError> {
        if !self.connectivity.is_online() {
            tracing::debug!(target: "offline::sync", trigger = %trigger, "offline; skipping pass");
            return Ok(PassOutcome::SkippedOffline);
        }
        if self
            .is_syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(target: "offline::sync", trigger = %trigger, "pass already running");
            return Ok(PassOutcome::SkippedBusy);
        }
        let guard = SyncingGuard(&self.is_syncing);

        self.events.emit(OfflineEvent::SyncStarted);
        let started_at = Utc::now();
        tracing::info!(target: "offline::sync", trigger = %trigger, "sync pass started");

        let result = self.process_pending(started_at).await;
        drop(guard);

        match result {
            Ok(report) => {
                self.record_completion(&report).await;
                self.metrics.record_pass(&report, trigger.as_str());
                tracing::info!(
                    target: "offline::sync",
                    trigger = %trigger,
                    synced = report.synced,
                    failed = report.failed,
                    dropped = report.dropped.len(),
                    duration_ms = report.duration_ms(),
                    "sync pass completed"
                );
                self.events.emit(OfflineEvent::SyncCompleted {
                    synced: report.synced,
                    failed: report.failed,
                    dropped: report.dropped.clone(),
                });
                Ok(PassOutcome::Completed(report))
            }
            Err(err) => {
                self.metrics
                    .record_failed_pass(trigger.as_str(), &err.to_string());
                tracing::error!(
                    target: "offline::sync",
                    trigger = %trigger,
                    error = %err,
                    "sync pass aborted"
                );
                self.events.emit(OfflineEvent::SyncFailed {
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn process_pending(&self, started_at: DateTime<Utc>) -> Result<SyncReport, AppError> {
        // Only one pass runs at a time, so any `syncing` row here was stranded
        // by an earlier pass that aborted.
        let stranded = self.store.recover_interrupted().await?;
        if stranded > 0 {
            tracing::warn!(
                target: "offline::sync",
                count = stranded,
                "returned stranded operations to pending"
            );
        }
        let pending = self.store.list_by_status(&OperationStatus::Pending).await?;
        let mut report = SyncReport::empty(started_at);

        'batches: for (index, batch) in pending.chunks(self.settings.batch_size).enumerate() {
            if index > 0 && !self.settings.batch_pause.is_zero() {
                tokio::time::sleep(self.settings.batch_pause).await;
            }
            for operation in batch {
                if !self.connectivity.is_online() {
                    tracing::warn!(
                        target: "offline::sync",
                        remaining = (pending.len() as u32).saturating_sub(report.attempted()),
                        "connection lost mid-pass; leaving the rest pending"
                    );
                    break 'batches;
                }
                self.sync_operation(operation.clone(), &mut report).await?;
            }
        }

        report.finished_at = Utc::now();
        Ok(report)
    }

    async fn sync_operation(
        &self,
        mut operation: QueuedOperation,
        report: &mut SyncReport,
    ) -> Result<(), AppError> {
        operation.mark_syncing();
        match self.store.update_operation(&operation).await {
            Ok(()) => {}
            Err(AppError::NotFound(_)) => return Ok(()),
            Err(err) => return Err(err),
        }

        let result = self.settle(&mut operation, report).await;
        if result.is_err() {
            self.release(&mut operation).await;
        }
        result
    }

    /// Replays a `syncing` operation and writes the outcome back.
    async fn settle(
        &self,
        operation: &mut QueuedOperation,
        report: &mut SyncReport,
    ) -> Result<(), AppError> {
        let failure = match self.dispatch(operation).await {
            Ok(()) => {
                self.store.delete_operation(&operation.id).await?;
                report.synced += 1;
                tracing::debug!(
                    target: "offline::sync",
                    operation_id = %operation.id,
                    entity_type = %operation.entity_type,
                    operation_type = %operation.operation_type,
                    "operation synced"
                );
                return Ok(());
            }
            Err(failure) => failure,
        };

        report.failed += 1;
        let exhausted = operation.record_failure(failure.to_string(), self.settings.max_retries);
        let reason = match failure.drop_reason() {
            Some(reason) => Some(reason),
            None if exhausted => Some(DropReason::RetriesExhausted),
            None => None,
        };

        match reason {
            Some(reason) => {
                let letter = DeadLetter::from_operation(operation, reason, Utc::now());
                self.store.move_to_dead_letters(&letter).await?;
                report.dropped.push(operation.id.clone());
                tracing::warn!(
                    target: "offline::sync",
                    operation_id = %operation.id,
                    retry_count = operation.retry_count,
                    reason = %reason,
                    error = %failure,
                    "operation dropped to dead letters"
                );
            }
            None => {
                self.store.update_operation(operation).await?;
                tracing::debug!(
                    target: "offline::sync",
                    operation_id = %operation.id,
                    retry_count = operation.retry_count,
                    error = %failure,
                    "operation will be retried"
                );
            }
        }
        Ok(())
    }

    /// Best effort: a write failure here is left to the next pass's sweep.
    async fn release(&self, operation: &mut QueuedOperation) {
        operation.mark_pending();
        if let Err(err) = self.store.update_operation(operation).await {
            tracing::warn!(
                target: "offline::sync",
                operation_id = %operation.id,
                error = %err,
                "could not return operation to pending"
            );
        }
    }

    async fn dispatch(&self, operation: &QueuedOperation) -> Result<(), OperationFailure> {
        if !operation.entity_type.supports(operation.operation_type) {
            return Err(OperationFailure::Unsupported(format!(
                "{} of {}",
                operation.operation_type, operation.entity_type
            )));
        }

        let call = async {
            let entity_type = operation.entity_type;
            let payload = operation.payload.as_json();
            match operation.operation_type {
                OperationType::Create => self.remote.create(entity_type, payload).await.map(|_| ()),
                OperationType::Update => {
                    let entity_id = operation.entity_id.as_ref().ok_or_else(|| {
                        AppError::ValidationError("update without an entity id".to_string())
                    })?;
                    self.remote
                        .update(entity_type, entity_id, payload)
                        .await
                        .map(|_| ())
                }
                OperationType::Delete => {
                    let entity_id = operation.entity_id.as_ref().ok_or_else(|| {
                        AppError::ValidationError("delete without an entity id".to_string())
                    })?;
                    self.remote.delete(entity_type, entity_id).await
                }
            }
        };

        match tokio::time::timeout(self.settings.remote_timeout, call).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(OperationFailure::from_remote(err)),
            Err(_) => Err(OperationFailure::Timeout(self.settings.remote_timeout)),
        }
    }

    async fn record_completion(&self, report: &SyncReport) {
        *self.last_sync.write().await = Some(report.finished_at);

        let finished = report.finished_at.to_rfc3339();
        if let Err(err) = self
            .store
            .put_sync_metadata(LAST_SYNC_TIME_KEY, &finished)
            .await
        {
            tracing::warn!(target: "offline::sync", error = %err, "failed to persist last sync time");
        }
        match serde_json::to_string(report) {
            Ok(json) => {
                if let Err(err) = self.store.put_sync_metadata(LAST_SYNC_REPORT_KEY, &json).await {
                    tracing::warn!(target: "offline::sync", error = %err, "failed to persist sync report");
                }
            }
            Err(err) => {
                tracing::warn!(target: "offline::sync", error = %err, "failed to encode sync report");
            }
        }
    }
}
