//! API Response Store operations.
//!
//! Provides get/put/delete/list over the `api_data` table. The key is the
//! full request URL including query parameters; writes are UPSERTs, so the
//! most recently completed write for a key wins.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A cached API response.
///
/// `data` is the decoded JSON payload; `timestamp` is milliseconds since
/// epoch at write time. Freshness is judged against it by the read path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEntry {
    pub url: String,
    pub data: serde_json::Value,
    pub timestamp: i64,
}

impl CacheDb {
    /// Insert or update a cached API response.
    ///
    /// Uses UPSERT semantics: inserts if the URL doesn't exist, replaces
    /// the whole record if it does. There is no version check; a racing
    /// writer for the same URL is overwritten (last-write-wins).
    pub async fn put_api_entry(&self, url: &str, data: &serde_json::Value, timestamp: i64) -> Result<(), Error> {
        let url = url.to_string();
        let json = serde_json::to_string(data).map_err(|e| Error::InvalidJson(e.to_string()))?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO api_data (url, data, timestamp)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(url) DO UPDATE SET
                         data = excluded.data,
                         timestamp = excluded.timestamp",
                    params![url, json, timestamp],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a cached API response by URL.
    ///
    /// Returns None if the URL doesn't exist in the store. Freshness is
    /// not checked here; that is the read path's job.
    pub async fn get_api_entry(&self, url: &str) -> Result<Option<ApiEntry>, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<ApiEntry>, Error> {
                let mut stmt = conn.prepare("SELECT url, data, timestamp FROM api_data WHERE url = ?1")?;

                let result = stmt.query_row(params![url], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
                });

                match result {
                    Ok((url, json, timestamp)) => {
                        let data = serde_json::from_str(&json).map_err(|e| Error::InvalidJson(e.to_string()))?;
                        Ok(Some(ApiEntry { url, data, timestamp }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a cached API response.
    ///
    /// Returns true if an entry was removed.
    pub async fn delete_api_entry(&self, url: &str) -> Result<bool, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM api_data WHERE url = ?1", params![url])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List every stored API entry.
    ///
    /// The refresh scheduler enumerates this to re-fetch each URL.
    pub async fn list_api_entries(&self) -> Result<Vec<ApiEntry>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<ApiEntry>, Error> {
                let mut stmt = conn.prepare("SELECT url, data, timestamp FROM api_data ORDER BY url")?;

                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
                })?;

                let mut entries = Vec::new();
                for row in rows {
                    let (url, json, timestamp) = row?;
                    let data = serde_json::from_str(&json).map_err(|e| Error::InvalidJson(e.to_string()))?;
                    entries.push(ApiEntry { url, data, timestamp });
                }
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of stored API entries.
    pub async fn count_api_entries(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM api_data", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
