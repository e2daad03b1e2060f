//! cache-worker entry point.
//!
//! Boots the interception cache worker as a standalone process: loads the
//! config, opens the store, runs the install/activate lifecycle, and parks
//! until interrupted. Logging goes to stderr.

use std::sync::Arc;

use anyhow::Result;
use intercept_client::{FetchClient, FetchConfig};
use intercept_core::{CacheDb, WorkerConfig};
use intercept_worker::Worker;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = WorkerConfig::load()?;
    tracing::info!(version = %config.cache_version, db = %config.db_path.display(), "starting cache worker");

    let db = CacheDb::open(&config.db_path).await?;

    let fetch_config = FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    };
    let upstream = Arc::new(FetchClient::new(fetch_config)?);

    let worker = Worker::new(config, db, upstream);
    worker.on_install().await?;
    worker.on_activate().await?;

    tracing::info!("cache worker active");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    Ok(())
}
