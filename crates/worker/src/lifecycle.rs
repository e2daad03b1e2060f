//! Worker lifecycle management.
//!
//! Brings the worker's runtime and its two stores into a consistent state
//! across worker generations: install populates the current static cache
//! set, activation garbage-collects superseded sets, notifies controlled
//! pages, and starts the refresh scheduler when enabled.

use std::sync::Arc;

use intercept_client::Upstream;
use intercept_core::{CacheDb, Error, WorkerConfig};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;

use crate::scheduler;

/// Lifecycle state of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    Active,
}

/// Structured message broadcast to controlled pages.
///
/// `UpdateAvailable` is the only message emitted; pages may react by
/// prompting a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    UpdateAvailable,
}

/// The interception cache worker.
///
/// Owns the store handle, the upstream client, and the current lifecycle
/// state. Request handling and the scheduler share the store with no
/// locking beyond per-operation atomicity; concurrent writes to the same
/// URL are last-write-wins.
pub struct Worker {
    config: WorkerConfig,
    db: CacheDb,
    upstream: Arc<dyn Upstream>,
    state: RwLock<WorkerState>,
    updates: broadcast::Sender<WorkerMessage>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    /// Construct a worker in the `Installing` state.
    pub fn new(config: WorkerConfig, db: CacheDb, upstream: Arc<dyn Upstream>) -> Self {
        let (updates, _) = broadcast::channel(16);
        Self {
            config,
            db,
            upstream,
            state: RwLock::new(WorkerState::Installing),
            updates,
            refresh_task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub(crate) fn upstream(&self) -> &dyn Upstream {
        self.upstream.as_ref()
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Subscribe to worker messages, as a controlled page would.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkerMessage> {
        self.updates.subscribe()
    }

    /// Install: populate the current static cache set from the manifest.
    ///
    /// Every manifest path is fetched against the configured origin and
    /// written into the generation named for the current cache version.
    /// Any asset failing to fetch fails the install as a whole. There is
    /// no waiting step: a successful install proceeds straight to
    /// activation.
    pub async fn on_install(&self) -> Result<(), Error> {
        let cache_name = self.config.static_cache_name();
        let origin = self.config.origin.trim_end_matches('/');

        for path in &self.config.static_assets {
            let url = format!("{origin}{path}");
            let response = self.upstream.fetch(&url).await?;
            if !response.is_ok() {
                return Err(Error::Http(format!("asset {path} returned status {}", response.status.as_u16())));
            }
            self.db
                .put_asset(&cache_name, path, response.content_type.clone(), response.bytes.to_vec())
                .await?;
        }

        tracing::info!(
            cache = %cache_name,
            assets = self.config.static_assets.len(),
            "install complete, static assets cached"
        );
        Ok(())
    }

    /// Activate: GC old static generations, notify pages, claim control.
    ///
    /// Every static cache set whose name differs from the current
    /// generation is deleted wholesale. Subscribed pages receive an
    /// `UPDATE_AVAILABLE` message. The worker then takes control
    /// immediately and, if configured, starts the refresh scheduler.
    pub async fn on_activate(&self) -> Result<(), Error> {
        let current = self.config.static_cache_name();

        for name in self.db.list_cache_names().await? {
            if name != current {
                let deleted = self.db.delete_cache_set(&name).await?;
                tracing::info!(cache = %name, deleted, "removed superseded static cache set");
            }
        }

        // No receivers is fine: no pages are listening yet.
        let _ = self.updates.send(WorkerMessage::UpdateAvailable);

        *self.state.write().await = WorkerState::Active;

        if self.config.refresh_enabled {
            self.start_scheduler().await;
        }

        tracing::info!("worker activated");
        Ok(())
    }

    /// Spawn the refresh loop. Idempotent: a second call is a no-op.
    async fn start_scheduler(&self) {
        let mut guard = self.refresh_task.lock().await;
        if guard.is_some() {
            return;
        }

        let db = self.db.clone();
        let upstream = Arc::clone(&self.upstream);
        let period = self.config.refresh_period();
        *guard = Some(tokio::spawn(scheduler::run(db, upstream, period)));
        tracing::info!(period_ms = self.config.refresh_period_ms, "refresh scheduler started");
    }

    /// Whether the refresh loop has been spawned.
    pub async fn scheduler_running(&self) -> bool {
        self.refresh_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::MockUpstream;
    use serde_json::json;

    async fn test_worker(config: WorkerConfig, upstream: Arc<MockUpstream>) -> Worker {
        let db = CacheDb::open_in_memory().await.unwrap();
        Worker::new(config, db, upstream)
    }

    fn manifest_config() -> WorkerConfig {
        WorkerConfig {
            origin: "http://localhost:3000".into(),
            static_assets: vec!["/".into(), "/app.js".into()],
            ..Default::default()
        }
    }

    fn mock_manifest(upstream: &MockUpstream) {
        upstream.insert("http://localhost:3000/", 200, Some("text/html"), b"<html>".to_vec());
        upstream.insert("http://localhost:3000/app.js", 200, Some("text/javascript"), b"js".to_vec());
    }

    #[tokio::test]
    async fn test_install_populates_static_set() {
        let upstream = Arc::new(MockUpstream::new());
        mock_manifest(&upstream);
        let worker = test_worker(manifest_config(), Arc::clone(&upstream)).await;

        worker.on_install().await.unwrap();

        let name = worker.config().static_cache_name();
        let asset = worker.db().get_asset(&name, "/app.js").await.unwrap().unwrap();
        assert_eq!(asset.body, b"js");
        assert_eq!(asset.content_type.as_deref(), Some("text/javascript"));
        assert_eq!(worker.state().await, WorkerState::Installing);
    }

    #[tokio::test]
    async fn test_install_fails_when_asset_fetch_fails() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.insert("http://localhost:3000/", 200, Some("text/html"), b"<html>".to_vec());
        upstream.insert("http://localhost:3000/app.js", 404, None, Vec::new());
        let worker = test_worker(manifest_config(), Arc::clone(&upstream)).await;

        assert!(worker.on_install().await.is_err());
    }

    #[tokio::test]
    async fn test_activate_deletes_superseded_generations() {
        let upstream = Arc::new(MockUpstream::new());
        mock_manifest(&upstream);
        let worker = test_worker(manifest_config(), Arc::clone(&upstream)).await;

        // A leftover generation from a previous worker version.
        worker
            .db()
            .put_asset("static-v0.9", "/", None, b"old".to_vec())
            .await
            .unwrap();

        worker.on_install().await.unwrap();
        worker.on_activate().await.unwrap();

        let names = worker.db().list_cache_names().await.unwrap();
        assert_eq!(names, vec![worker.config().static_cache_name()]);

        // The current generation survives untouched.
        let asset = worker
            .db()
            .get_asset(&worker.config().static_cache_name(), "/")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(asset.body, b"<html>");
    }

    #[tokio::test]
    async fn test_activate_broadcasts_update_and_claims() {
        let upstream = Arc::new(MockUpstream::new());
        mock_manifest(&upstream);
        let worker = test_worker(manifest_config(), Arc::clone(&upstream)).await;
        let mut page = worker.subscribe();

        worker.on_install().await.unwrap();
        worker.on_activate().await.unwrap();

        assert_eq!(page.recv().await.unwrap(), WorkerMessage::UpdateAvailable);
        assert_eq!(worker.state().await, WorkerState::Active);
        assert!(!worker.scheduler_running().await);
    }

    #[tokio::test]
    async fn test_activate_starts_scheduler_when_enabled() {
        let upstream = Arc::new(MockUpstream::new());
        mock_manifest(&upstream);
        upstream.insert_json("http://localhost:3000/api/x", &json!({"v": 2}));

        let config = WorkerConfig { refresh_enabled: true, ..manifest_config() };
        let worker = test_worker(config, Arc::clone(&upstream)).await;

        // Pre-existing entry the initial refresh pass should rewrite.
        worker
            .db()
            .put_api_entry("http://localhost:3000/api/x", &json!({"v": 1}), 0)
            .await
            .unwrap();

        worker.on_install().await.unwrap();
        worker.on_activate().await.unwrap();
        assert!(worker.scheduler_running().await);

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        let entry = worker
            .db()
            .get_api_entry("http://localhost:3000/api/x")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.data, json!({"v": 2}));
        assert!(entry.timestamp > 0);
    }

    #[tokio::test]
    async fn test_update_message_wire_shape() {
        let encoded = serde_json::to_value(WorkerMessage::UpdateAvailable).unwrap();
        assert_eq!(encoded, json!({"type": "UPDATE_AVAILABLE"}));
    }
}
