use crate::application::ports::ReachabilityProbe;
use crate::application::services::event_bus::{OfflineEvent, OfflineEventBus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(30);

pub fn clamp_poll_interval(interval: Duration) -> Duration {
    interval.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL)
}

/// Tracks whether the remote backend is reachable.
///
/// The current value lives in a `watch` channel so the sync coordinator can
/// react to transitions; every transition is also published on the event bus.
pub struct ConnectivityMonitor {
    state: watch::Sender<bool>,
    events: OfflineEventBus,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool, events: OfflineEventBus) -> Self {
        let (state, _) = watch::channel(initially_online);
        Self { state, events }
    }

    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    /// Applies a reachability report. Returns true when it changed the state;
    /// repeated reports of the current state are ignored.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            if online {
                tracing::info!(target: "offline::connectivity", "connection restored");
                self.events.emit(OfflineEvent::ConnectionRestored);
            } else {
                tracing::warn!(target: "offline::connectivity", "connection lost");
                self.events.emit(OfflineEvent::ConnectionLost);
            }
        }
        changed
    }

    pub async fn poll_once(&self, probe: &dyn ReachabilityProbe) -> bool {
        let reachable = probe.is_reachable().await;
        self.set_online(reachable);
        reachable
    }

    /// Fallback for hosts without push connectivity events.
    pub fn spawn_polling(
        self: &Arc<Self>,
        probe: Arc<dyn ReachabilityProbe>,
        interval: Duration,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        let every = clamp_poll_interval(interval);
        tracing::debug!(
            target: "offline::connectivity",
            interval_ms = every.as_millis() as u64,
            "starting reachability polling"
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                monitor.poll_once(probe.as_ref()).await;
            }
        })
    }
}
