use crate::application::services::connectivity_service::ConnectivityMonitor;
use crate::application::services::sync_service::{PassOutcome, SyncEngine, SyncTrigger};
use crate::domain::entities::offline::SyncReport;
use crate::shared::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

const COMMAND_BUFFER: usize = 32;

pub type ForceReply = oneshot::Sender<Result<SyncReport, AppError>>;

pub enum SyncCommand {
    Trigger(SyncTrigger),
    Force(ForceReply),
}

/// Cloneable front door to the coordinator task.
#[derive(Clone)]
pub struct SyncHandle {
    sender: mpsc::Sender<SyncCommand>,
}

impl SyncHandle {
    /// Fire-and-forget. A full buffer means passes are already queued, so the
    /// request is dropped.
    pub fn request(&self, trigger: SyncTrigger) {
        match self.sender.try_send(SyncCommand::Trigger(trigger)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::trace!(target: "offline::sync", trigger = %trigger, "sync request coalesced");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(target: "offline::sync", trigger = %trigger, "sync coordinator is stopped");
            }
        }
    }

    /// Runs a pass (or joins the one in flight) and waits for its report.
    pub async fn force(&self) -> Result<SyncReport, AppError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(SyncCommand::Force(reply))
            .await
            .map_err(|_| AppError::Internal("sync coordinator is stopped".to_string()))?;
        response
            .await
            .map_err(|_| AppError::Internal("sync coordinator dropped the request".to_string()))?
    }
}

/// Owns the only call site of `SyncEngine::run_pass` in a running app, so
/// passes never overlap.
pub struct SyncCoordinator {
    engine: Arc<SyncEngine>,
    connectivity: Arc<ConnectivityMonitor>,
    receiver: mpsc::Receiver<SyncCommand>,
    online: watch::Receiver<bool>,
    ticker: Option<Interval>,
    sync_on_reconnect: bool,
}

impl SyncCoordinator {
    /// `periodic` of `None` disables the timer; the first tick fires one full
    /// period after start.
    pub fn spawn(
        engine: Arc<SyncEngine>,
        connectivity: Arc<ConnectivityMonitor>,
        periodic: Option<Duration>,
        sync_on_reconnect: bool,
    ) -> (SyncHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
        // Subscribed before the task starts so a transition made right after
        // `spawn` returns is still observed.
        let online = connectivity.subscribe();
        let ticker = periodic.map(|period| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        let coordinator = Self {
            engine,
            connectivity,
            receiver,
            online,
            ticker,
            sync_on_reconnect,
        };
        let task = tokio::spawn(coordinator.run());
        (SyncHandle { sender }, task)
    }

    async fn run(mut self) {
        loop {
            let command = tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
                changed = self.online.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if *self.online.borrow_and_update() && self.sync_on_reconnect {
                        SyncCommand::Trigger(SyncTrigger::ConnectionRestored)
                    } else {
                        continue;
                    }
                }
                _ = next_tick(&mut self.ticker) => SyncCommand::Trigger(SyncTrigger::Periodic),
            };

            self.handle(command).await;
        }

        tracing::debug!(target: "offline::sync", "sync coordinator stopped");
    }

    async fn handle(&mut self, command: SyncCommand) {
        let mut next = Some(command);

        while let Some(command) = next.take() {
            let mut waiters = Vec::new();
            let trigger = match command {
                SyncCommand::Trigger(trigger) => trigger,
                SyncCommand::Force(reply) => {
                    if !self.connectivity.is_online() {
                        let _ = reply.send(Err(offline_error()));
                        continue;
                    }
                    waiters.push(reply);
                    SyncTrigger::Manual
                }
            };

            let outcome = self.engine.run_pass(trigger).await;

            // Forces queued during the pass are answered by it; triggers
            // collapse into a single follow-up pass.
            while let Ok(queued) = self.receiver.try_recv() {
                match queued {
                    SyncCommand::Force(reply) => waiters.push(reply),
                    SyncCommand::Trigger(trigger) => next = Some(SyncCommand::Trigger(trigger)),
                }
            }

            if !waiters.is_empty() {
                let result = force_result(outcome);
                for waiter in waiters {
                    let _ = waiter.send(result.clone());
                }
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(ticker) => ticker.tick().await,
        None => std::future::pending().await,
    }
}

fn offline_error() -> AppError {
    AppError::Offline("cannot sync while offline".to_string())
}

fn force_result(outcome: Result<PassOutcome, AppError>) -> Result<SyncReport, AppError> {
    match outcome? {
        PassOutcome::Completed(report) => Ok(report),
        PassOutcome::SkippedOffline => Err(offline_error()),
        PassOutcome::SkippedBusy => Err(AppError::SyncInProgress(
            "another pass holds the sync engine".to_string(),
        )),
    }
}
