//! SQLite-backed persistent store for the cache worker.
//!
//! This module provides the two shared stores the worker owns, with async
//! access via tokio-rusqlite:
//!
//! - API Response Store: decoded JSON payloads keyed by full request URL,
//!   with a write timestamp (millisecond epoch)
//! - Static asset generations: versioned sets of pre-fetched response
//!   bodies, garbage-collected wholesale at activation
//!
//! Individual get/put/delete calls are atomic; multi-step sequences
//! (check-then-fetch-then-write) are not, and writes are last-write-wins.

pub mod api;
pub mod assets;
pub mod connection;
pub mod migrations;

pub use crate::Error;

pub use api::ApiEntry;
pub use assets::StaticAsset;
pub use connection::CacheDb;
