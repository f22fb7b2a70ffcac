use crate::application::ports::{OfflineQueueStore, ReachabilityProbe, RemoteStore};
use crate::application::services::{
    ConnectivityMonitor, OfflineEventBus, OfflineService, OperationQueue, QueueLimits,
    ReadThroughCache, SubscriptionRegistry, SyncCoordinator, SyncEngine, SyncSettings,
    SyncTrigger,
};
use crate::infrastructure::connectivity::TcpReachabilityProbe;
use crate::infrastructure::database::ConnectionPool;
use crate::infrastructure::offline::{SqliteOfflineStore, SyncMetrics};
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Wires the queue, sync engine, cache and connectivity monitor together
/// and owns their background tasks.
pub struct OfflineRuntime {
    service: Arc<OfflineService>,
    connectivity: Arc<ConnectivityMonitor>,
    subscriptions: Arc<SubscriptionRegistry>,
    pool: Option<ConnectionPool>,
    tasks: Vec<JoinHandle<()>>,
    config: AppConfig,
}

pub struct OfflineRuntimeBuilder {
    config: AppConfig,
    store: Option<Arc<dyn OfflineQueueStore>>,
    remote: Option<Arc<dyn RemoteStore>>,
    probe: Option<Arc<dyn ReachabilityProbe>>,
    initially_online: Option<bool>,
}

impl OfflineRuntime {
    pub fn builder(config: AppConfig) -> OfflineRuntimeBuilder {
        OfflineRuntimeBuilder {
            config,
            store: None,
            remote: None,
            probe: None,
            initially_online: None,
        }
    }

    pub fn service(&self) -> Arc<OfflineService> {
        Arc::clone(&self.service)
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Releases remote subscriptions, stops background tasks and closes the
    /// pool the runtime opened itself.
    pub async fn shutdown(mut self) {
        let released = self.subscriptions.unsubscribe_all().await;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if let Some(pool) = self.pool.take() {
            pool.close().await;
        }
        tracing::info!(target: "offline::sync", released, "offline runtime stopped");
    }
}

impl Drop for OfflineRuntime {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl OfflineRuntimeBuilder {
    /// Defaults to a SQLite store opened from `config.database`.
    pub fn with_store(mut self, store: Arc<dyn OfflineQueueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Enables background polling. Without a probe (and without
    /// `connectivity.probe_address`) the host reports state via
    /// `ConnectivityMonitor::set_online`.
    pub fn with_probe(mut self, probe: Arc<dyn ReachabilityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn initially_online(mut self, online: bool) -> Self {
        self.initially_online = Some(online);
        self
    }

    pub async fn start(self) -> Result<OfflineRuntime, AppError> {
        let OfflineRuntimeBuilder {
            config,
            store,
            remote,
            probe,
            initially_online,
        } = self;

        config.validate().map_err(AppError::ConfigurationError)?;
        let remote = remote
            .ok_or_else(|| AppError::ConfigurationError("a remote store is required".to_string()))?;

        let (store, pool): (Arc<dyn OfflineQueueStore>, Option<ConnectionPool>) = match store {
            Some(store) => (store, None),
            None => {
                let pool = ConnectionPool::new(&config.database).await?;
                pool.migrate().await?;
                let store = Arc::new(SqliteOfflineStore::new(pool.get_pool().clone()));
                (store, Some(pool))
            }
        };

        let recovered = store.recover_interrupted().await?;
        if recovered > 0 {
            tracing::info!(
                target: "offline::queue",
                recovered,
                "requeued operations left over from an interrupted pass"
            );
        }

        let probe: Option<Arc<dyn ReachabilityProbe>> = match probe {
            Some(probe) => Some(probe),
            None => config.connectivity.probe_address.as_ref().map(|address| {
                Arc::new(TcpReachabilityProbe::new(
                    address.clone(),
                    config.connectivity.probe_timeout(),
                )) as Arc<dyn ReachabilityProbe>
            }),
        };

        let online = match (initially_online, probe.as_ref()) {
            (Some(online), _) => online,
            (None, Some(probe)) => probe.is_reachable().await,
            (None, None) => true,
        };

        let events = OfflineEventBus::new();
        let connectivity = Arc::new(ConnectivityMonitor::new(online, events.clone()));
        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            Arc::clone(&connectivity),
            events.clone(),
            Arc::new(SyncMetrics::new()),
            SyncSettings::from(&config.sync),
        ));
        engine.restore_state().await?;

        let auto_sync = config.sync.auto_sync;
        let periodic = auto_sync.then(|| config.sync.interval());
        let (sync, coordinator) = SyncCoordinator::spawn(
            Arc::clone(&engine),
            Arc::clone(&connectivity),
            periodic,
            auto_sync,
        );
        let mut tasks = vec![coordinator];

        let mut queue = OperationQueue::new(
            Arc::clone(&store),
            Arc::clone(&connectivity),
            QueueLimits::from(&config.queue),
        );
        if auto_sync {
            queue = queue.with_sync_trigger(sync.clone());
        }

        let cache = ReadThroughCache::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            Arc::clone(&connectivity),
            config.sync.remote_timeout(),
        );
        let subscriptions = Arc::new(SubscriptionRegistry::new(Arc::clone(&remote)));

        let service = Arc::new(OfflineService::new(
            Arc::new(queue),
            Arc::new(cache),
            engine,
            Arc::clone(&connectivity),
            events,
            sync.clone(),
            Arc::clone(&subscriptions),
        ));

        if let Some(probe) = probe {
            tasks.push(connectivity.spawn_polling(probe, config.connectivity.poll_every()));
        }

        if auto_sync && connectivity.is_online() {
            sync.request(SyncTrigger::Startup);
        }

        tracing::info!(
            target: "offline::sync",
            online,
            auto_sync,
            "offline runtime started"
        );

        Ok(OfflineRuntime {
            service,
            connectivity,
            subscriptions,
            pool,
            tasks,
            config,
        })
    }
}
