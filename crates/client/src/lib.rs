//! Upstream HTTP access for the cache worker.
//!
//! This crate provides the fetch pipeline and the `Upstream` trait the
//! worker is built against, so tests can substitute an in-memory upstream.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, FetchResponse, Upstream};
pub use reqwest::StatusCode;
