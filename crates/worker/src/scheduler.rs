//! Background refresh scheduler.
//!
//! Keeps every already-cached URL reasonably fresh without waiting for a
//! page to request it again: on a fixed period, every entry in the API
//! Response Store is independently re-fetched and overwritten with a new
//! timestamp. One URL failing never aborts the rest of the pass.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use intercept_client::Upstream;
use intercept_core::{CacheDb, Error};
use tokio::time::MissedTickBehavior;

use crate::lifecycle::Worker;

/// Counts from one refresh pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshStats {
    pub refreshed: u64,
    pub failed: u64,
}

/// Refresh loop: an immediate first pass, then one pass per period.
///
/// Runs until the task is dropped; a pass in flight is never cancelled
/// mid-entry.
pub async fn run(db: CacheDb, upstream: Arc<dyn Upstream>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // The first tick completes immediately: the initial pass.
        ticker.tick().await;
        let stats = refresh_pass(&db, upstream.as_ref()).await;
        tracing::info!(refreshed = stats.refreshed, failed = stats.failed, "refresh pass complete");
    }
}

/// Re-fetch every stored URL once, each entry in isolation.
pub async fn refresh_pass(db: &CacheDb, upstream: &dyn Upstream) -> RefreshStats {
    let entries = match db.list_api_entries().await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(error = %e, "refresh pass could not enumerate store");
            return RefreshStats::default();
        }
    };

    let mut stats = RefreshStats::default();
    for entry in entries {
        match refresh_entry(db, upstream, &entry.url).await {
            Ok(()) => stats.refreshed += 1,
            Err(e) => {
                stats.failed += 1;
                tracing::warn!(url = %entry.url, error = %e, "failed to refresh entry");
            }
        }
    }
    stats
}

/// Fetch one URL and overwrite its entry with a fresh timestamp.
///
/// Requires an ok status and a JSON-decodable body; on failure the stored
/// entry is left exactly as it was.
async fn refresh_entry(db: &CacheDb, upstream: &dyn Upstream, url: &str) -> Result<(), Error> {
    let response = upstream.fetch(url).await?;
    if !response.is_ok() {
        return Err(Error::Http(format!("status {}", response.status.as_u16())));
    }

    let data: serde_json::Value =
        serde_json::from_slice(&response.bytes).map_err(|e| Error::InvalidJson(e.to_string()))?;

    db.put_api_entry(url, &data, Utc::now().timestamp_millis()).await
}

impl Worker {
    /// Run one refresh pass against this worker's store and upstream.
    pub async fn refresh_pass(&self) -> RefreshStats {
        refresh_pass(self.db(), self.upstream()).await
    }
}
