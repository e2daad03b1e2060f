//! Cache-aside read path for API requests.
//!
//! Serves from the API Response Store when a fresh entry exists; otherwise
//! fetches live, stores the decoded result, and returns the original
//! network response. Every failure is converted into a substitute
//! `{"error": ...}` JSON body, so the calling page always receives a
//! parseable response.

use chrono::Utc;
use intercept_core::{ApiEntry, Error};

use crate::lifecycle::Worker;
use crate::request::WorkerResponse;

impl Worker {
    /// Resolve an API request to a JSON response.
    ///
    /// Infallible by construction: hits are served from the store, misses
    /// fall back to the network, and any failure along the way becomes an
    /// error-shaped JSON response rather than propagating.
    pub async fn resolve(&self, url: &str) -> WorkerResponse {
        if let Some(entry) = self.lookup_fresh(url).await {
            tracing::debug!(url, "cache hit");
            return WorkerResponse::json(&entry.data);
        }

        tracing::debug!(url, "cache miss, fetching");
        match self.fetch_and_store(url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url, error = %e, "miss path failed, serving error body");
                WorkerResponse::error(&e.to_string())
            }
        }
    }

    /// Look up a fresh entry, purging it eagerly if stale.
    ///
    /// Store failures degrade to a miss rather than propagating, so a
    /// broken store only costs the cache, not the request.
    async fn lookup_fresh(&self, url: &str) -> Option<ApiEntry> {
        let entry = match self.db().get_api_entry(url).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(url, error = %e, "store lookup failed, treating as miss");
                return None;
            }
        };

        let age_ms = Utc::now().timestamp_millis() - entry.timestamp;
        if age_ms > self.config().ttl_ms as i64 {
            tracing::debug!(url, age_ms, "entry expired, removing stale entry");
            if let Err(e) = self.db().delete_api_entry(url).await {
                tracing::warn!(url, error = %e, "failed to remove stale entry");
            }
            return None;
        }

        Some(entry)
    }

    /// Miss path: live fetch, store, return the original response.
    ///
    /// The upstream response must be ok and declare a JSON content type;
    /// anything else is an invalid response. The decoded payload is
    /// written with a fresh timestamp (overwriting any concurrent write
    /// for the same key), and the caller gets the upstream body bytes
    /// unmodified rather than a re-encoding.
    async fn fetch_and_store(&self, url: &str) -> Result<WorkerResponse, Error> {
        let response = self.upstream().fetch(url).await?;

        if !response.is_ok() || !response.is_json() {
            return Err(Error::InvalidResponse);
        }

        let data: serde_json::Value =
            serde_json::from_slice(&response.bytes).map_err(|e| Error::InvalidJson(e.to_string()))?;

        self.db()
            .put_api_entry(url, &data, Utc::now().timestamp_millis())
            .await?;
        tracing::debug!(url, "store updated with fetched API data");

        Ok(WorkerResponse {
            status: response.status.as_u16(),
            content_type: response.content_type,
            body: response.bytes.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::MockUpstream;
    use intercept_core::{CacheDb, WorkerConfig};
    use serde_json::json;
    use std::sync::Arc;

    const FIVE_MINUTES_MS: u64 = 5 * 60 * 1000;

    async fn test_worker(upstream: Arc<MockUpstream>) -> Worker {
        let db = CacheDb::open_in_memory().await.unwrap();
        let config = WorkerConfig { ttl_ms: FIVE_MINUTES_MS, ..Default::default() };
        Worker::new(config, db, upstream)
    }

    fn ms_ago(ms: i64) -> i64 {
        Utc::now().timestamp_millis() - ms
    }

    #[tokio::test]
    async fn test_fresh_hit_returns_stored_data() {
        let upstream = Arc::new(MockUpstream::new());
        let worker = test_worker(Arc::clone(&upstream)).await;

        // Written one minute ago, TTL five minutes.
        worker
            .db()
            .put_api_entry("/api/x", &json!({"v": 1}), ms_ago(60_000))
            .await
            .unwrap();

        let response = worker.resolve("/api/x").await;
        assert_eq!(response.body_json().unwrap(), json!({"v": 1}));
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
        // Hit: the network was never consulted.
        assert!(upstream.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stale_read_purges_and_refetches() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.insert_json("/api/x", &json!({"v": 2}));
        let worker = test_worker(Arc::clone(&upstream)).await;

        let stale_ts = ms_ago(6 * 60 * 1000);
        worker
            .db()
            .put_api_entry("/api/x", &json!({"v": 1}), stale_ts)
            .await
            .unwrap();

        let response = worker.resolve("/api/x").await;
        assert_eq!(response.body_json().unwrap(), json!({"v": 2}));

        let entry = worker.db().get_api_entry("/api/x").await.unwrap().unwrap();
        assert_eq!(entry.data, json!({"v": 2}));
        assert!(entry.timestamp > stale_ts);
    }

    #[tokio::test]
    async fn test_stale_entry_removed_even_without_refetch() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.fail("/api/x");
        let worker = test_worker(Arc::clone(&upstream)).await;

        worker
            .db()
            .put_api_entry("/api/x", &json!({"v": 1}), ms_ago(6 * 60 * 1000))
            .await
            .unwrap();

        let _ = worker.resolve("/api/x").await;

        // Stale entries are purged eagerly at read time, not lazily ignored.
        assert!(worker.db().get_api_entry("/api/x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_miss_fetches_stores_and_returns_original_body() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.insert("/api/y", 200, Some("application/json; charset=utf-8"), b"{\"n\": 7}".to_vec());
        let worker = test_worker(Arc::clone(&upstream)).await;

        let response = worker.resolve("/api/y").await;
        // Original upstream bytes and content type, not a re-encoding.
        assert_eq!(response.body, b"{\"n\": 7}");
        assert_eq!(response.content_type.as_deref(), Some("application/json; charset=utf-8"));

        let entry = worker.db().get_api_entry("/api/y").await.unwrap().unwrap();
        assert_eq!(entry.data, json!({"n": 7}));
    }

    #[tokio::test]
    async fn test_upstream_500_yields_error_body_and_no_write() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.insert("/api/y", 500, Some("application/json"), b"{}".to_vec());
        let worker = test_worker(Arc::clone(&upstream)).await;

        let response = worker.resolve("/api/y").await;
        assert_eq!(response.body_json().unwrap(), json!({"error": "Invalid response"}));
        assert!(worker.db().get_api_entry("/api/y").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_json_upstream_yields_error_body() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.insert("/api/y", 200, Some("text/html"), b"<html>".to_vec());
        let worker = test_worker(Arc::clone(&upstream)).await;

        let response = worker.resolve("/api/y").await;
        assert_eq!(response.body_json().unwrap(), json!({"error": "Invalid response"}));
        assert!(worker.db().get_api_entry("/api/y").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_network_failure_yields_error_body() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.fail("/api/y");
        let worker = test_worker(Arc::clone(&upstream)).await;

        let response = worker.resolve("/api/y").await;
        let body = response.body_json().unwrap();
        assert!(body.get("error").is_some());
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_undecodable_json_body_yields_error_and_no_write() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.insert("/api/y", 200, Some("application/json"), b"{not json".to_vec());
        let worker = test_worker(Arc::clone(&upstream)).await;

        let response = worker.resolve("/api/y").await;
        let body = response.body_json().unwrap();
        assert!(body.get("error").is_some());
        assert!(worker.db().get_api_entry("/api/y").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read_preserves_fields() {
        let upstream = Arc::new(MockUpstream::new());
        let data = json!({"rows": [{"id": 1, "score": 9.5}], "next": null});
        upstream.insert_json("/api/board", &data);
        let worker = test_worker(Arc::clone(&upstream)).await;

        let _ = worker.resolve("/api/board").await;
        let response = worker.resolve("/api/board").await;
        assert_eq!(response.body_json().unwrap(), data);
        // Second resolve was a hit.
        assert_eq!(upstream.calls().len(), 1);
    }
}
