//! Interception cache worker.
//!
//! A background component that sits between controlled pages and a remote
//! API. Static-asset requests are served cache-first from a versioned
//! generation populated at install; API requests go through a cache-aside
//! read path over a persistent store with lazy TTL expiry; an optional
//! scheduler re-fetches every stored URL on a fixed period.
//!
//! The worker is driven through named lifecycle transitions
//! ([`Worker::on_install`], [`Worker::on_activate`]) and a single request
//! hook ([`Worker::on_request`]) instead of ambient event listeners.

pub mod interceptor;
pub mod lifecycle;
pub mod readpath;
pub mod request;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testsupport;

pub use interceptor::Intercept;
pub use lifecycle::{Worker, WorkerMessage, WorkerState};
pub use request::{Destination, PageRequest, WorkerResponse};
pub use scheduler::RefreshStats;
