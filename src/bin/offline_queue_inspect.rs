use anyhow::{Context, Result};
use barangay_offline::application::ports::OfflineQueueStore;
use barangay_offline::application::services::{
    ConnectivityMonitor, OfflineEventBus, OperationQueue, QueueLimits,
};
use barangay_offline::infrastructure::database::ConnectionPool;
use barangay_offline::infrastructure::offline::SqliteOfflineStore;
use barangay_offline::{AppConfig, EntityType};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "offline_queue_inspect")]
#[command(about = "Inspect and maintain the barangay offline queue database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database URL (defaults to the app configuration)
    #[arg(long, env = "BARANGAY_DATABASE_URL")]
    database_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", env = "LOG_LEVEL")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// Print queue statistics
    Stats,
    /// List queued operations in replay order
    Pending {
        /// Only show one entity type (document, incident, resident, ...)
        #[arg(long)]
        entity_type: Option<EntityType>,
    },
    /// Export operations dropped by the sync engine
    DeadLetters {
        /// Write JSON to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Delete every dead letter
    PurgeDeadLetters,
    /// Put operations stranded by a crash back into the pending state
    Recover,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut config = AppConfig::from_env();
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;

    let pool = ConnectionPool::new(&config.database)
        .await
        .with_context(|| format!("failed to open {}", config.database.url))?;
    pool.migrate().await.context("failed to apply migrations")?;
    let store = Arc::new(SqliteOfflineStore::new(pool.get_pool().clone()));

    match cli.command {
        Commands::Migrate => {
            info!("migrations applied to {}", config.database.url);
            println!("schema is up to date");
        }
        Commands::Stats => {
            let queue = OperationQueue::new(
                store.clone(),
                Arc::new(ConnectivityMonitor::new(false, OfflineEventBus::new())),
                QueueLimits::from(&config.queue),
            );
            print_json(&queue.stats().await?)?;
        }
        Commands::Pending { entity_type } => {
            let operations = match entity_type {
                Some(entity_type) => store.list_by_entity_type(entity_type).await?,
                None => store.list_operations().await?,
            };
            print_json(&operations)?;
        }
        Commands::DeadLetters { output } => {
            let letters = store.list_dead_letters().await?;
            let json = serde_json::to_string_pretty(&letters)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("exported {} dead letters to {}", letters.len(), path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::PurgeDeadLetters => {
            let purged = store.purge_dead_letters().await?;
            println!("purged {purged} dead letters");
        }
        Commands::Recover => {
            let recovered = store.recover_interrupted().await?;
            println!("requeued {recovered} operations");
        }
    }

    pool.close().await;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
