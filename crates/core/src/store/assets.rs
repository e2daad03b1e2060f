//! Static asset generation operations.
//!
//! Static responses live in versioned cache sets named for the cache
//! generation (e.g. `static-v1.1`). Only one generation is meant to be
//! live; superseded generations are deleted wholesale at activation.
//! There is no per-entry eviction in this layer.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A pre-fetched static response body.
#[derive(Debug, Clone)]
pub struct StaticAsset {
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl CacheDb {
    /// Store a static asset in the named cache set.
    ///
    /// Overwrites any existing asset at the same (cache_name, path).
    pub async fn put_asset(
        &self, cache_name: &str, path: &str, content_type: Option<String>, body: Vec<u8>,
    ) -> Result<(), Error> {
        let cache_name = cache_name.to_string();
        let path = path.to_string();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO static_assets (cache_name, path, content_type, body)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(cache_name, path) DO UPDATE SET
                         content_type = excluded.content_type,
                         body = excluded.body",
                    params![cache_name, path, content_type, body],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a static asset by exact path in the named cache set.
    pub async fn get_asset(&self, cache_name: &str, path: &str) -> Result<Option<StaticAsset>, Error> {
        let cache_name = cache_name.to_string();
        let path = path.to_string();

        self.conn
            .call(move |conn| -> Result<Option<StaticAsset>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT path, content_type, body FROM static_assets
                     WHERE cache_name = ?1 AND path = ?2",
                )?;

                let result = stmt.query_row(params![cache_name, path], |row| {
                    Ok(StaticAsset { path: row.get(0)?, content_type: row.get(1)?, body: row.get(2)? })
                });

                match result {
                    Ok(asset) => Ok(Some(asset)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List the names of every cache set present in the store.
    pub async fn list_cache_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT cache_name FROM static_assets ORDER BY cache_name")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

                let mut names = Vec::new();
                for row in rows {
                    names.push(row?);
                }
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete an entire cache set by name.
    ///
    /// Returns the number of deleted assets.
    pub async fn delete_cache_set(&self, cache_name: &str) -> Result<u64, Error> {
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM static_assets WHERE cache_name = ?1", params![cache_name])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
