use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_QUEUE_SIZE: u64 = 1000;
pub const DEFAULT_MAX_STORAGE_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
    pub sync: SyncConfig,
    pub connectivity: ConnectivityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    pub max_queue_size: u64,
    pub max_storage_size: u64,
    pub near_limit_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    /// Seconds between periodic passes.
    pub sync_interval: u64,
    pub max_retries: u32,
    pub batch_size: u32,
    pub batch_pause_ms: u64,
    /// Seconds a single remote call may take before it counts as a failure.
    pub remote_call_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    pub poll_interval: u64,
    #[serde(default)]
    pub probe_address: Option<String>,
    pub probe_timeout: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/barangay_offline.db?mode=rwc".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            queue: QueueConfig::default(),
            sync: SyncConfig::default(),
            connectivity: ConnectivityConfig::default(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            max_storage_size: DEFAULT_MAX_STORAGE_SIZE,
            near_limit_ratio: 0.8,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: true,
            sync_interval: 30,
            max_retries: 3,
            batch_size: 10,
            batch_pause_ms: 100,
            remote_call_timeout: 15,
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            poll_interval: 15,
            probe_address: None,
            probe_timeout: 3,
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval.max(1))
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_call_timeout.max(1))
    }
}

impl ConnectivityConfig {
    pub fn poll_every(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout.max(1))
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("BARANGAY_DATABASE_URL")
            && !v.trim().is_empty()
        {
            cfg.database.url = v.trim().to_string();
        }
        if let Ok(v) = std::env::var("BARANGAY_MAX_QUEUE_SIZE")
            && let Some(value) = parse_u64(&v)
        {
            cfg.queue.max_queue_size = value;
        }
        if let Ok(v) = std::env::var("BARANGAY_MAX_STORAGE_BYTES")
            && let Some(value) = parse_u64(&v)
        {
            cfg.queue.max_storage_size = value;
        }
        if let Ok(v) = std::env::var("BARANGAY_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Ok(v) = std::env::var("BARANGAY_SYNC_INTERVAL_SECS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.sync.sync_interval = value.max(1);
        }
        if let Ok(v) = std::env::var("BARANGAY_MAX_RETRIES")
            && let Some(value) = parse_u32(&v)
        {
            cfg.sync.max_retries = value;
        }
        if let Ok(v) = std::env::var("BARANGAY_SYNC_BATCH_SIZE")
            && let Some(value) = parse_u32(&v)
        {
            cfg.sync.batch_size = value;
        }
        if let Ok(v) = std::env::var("BARANGAY_SYNC_BATCH_PAUSE_MS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.sync.batch_pause_ms = value;
        }
        if let Ok(v) = std::env::var("BARANGAY_REMOTE_TIMEOUT_SECS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.sync.remote_call_timeout = value.max(1);
        }
        if let Ok(v) = std::env::var("BARANGAY_PROBE_ADDRESS") {
            let trimmed = v.trim();
            cfg.connectivity.probe_address = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
        }
        if let Ok(v) = std::env::var("BARANGAY_POLL_INTERVAL_SECS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.connectivity.poll_interval = value;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.queue.max_queue_size == 0 {
            return Err("Queue max_queue_size must be greater than 0".to_string());
        }
        if self.queue.max_storage_size == 0 {
            return Err("Queue max_storage_size must be greater than 0".to_string());
        }
        if !(self.queue.near_limit_ratio > 0.0 && self.queue.near_limit_ratio <= 1.0) {
            return Err("Queue near_limit_ratio must be within (0, 1]".to_string());
        }
        if self.sync.max_retries == 0 {
            return Err("Sync max_retries must be greater than 0".to_string());
        }
        if self.sync.batch_size == 0 {
            return Err("Sync batch_size must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}
