//! Core types and shared functionality for the interception cache worker.
//!
//! This crate provides:
//! - Persistent store with SQLite backend (API responses + static asset generations)
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod store;

pub use config::WorkerConfig;
pub use error::Error;
pub use store::{ApiEntry, CacheDb, StaticAsset};
