//! Unified error types for the cache worker.

use tokio_rusqlite::rusqlite;

/// Unified error types shared by the store, the fetch client, and the worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed.
    #[error("store error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("store error: migration failed: {0}")]
    MigrationFailed(String),

    /// Network-level fetch failure (connect, timeout, body read).
    #[error("fetch failed: {0}")]
    Http(String),

    /// Upstream answered but with a non-ok status or a non-JSON body.
    ///
    /// The display string is the message the page sees in the
    /// substituted `{"error": ...}` body.
    #[error("Invalid response")]
    InvalidResponse,

    /// Response body was not decodable as JSON.
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    /// URL failed to parse.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
