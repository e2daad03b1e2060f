//! Request/response boundary types.
//!
//! The worker intercepts requests as explicit values rather than ambient
//! events: a [`PageRequest`] comes in, and the interceptor either produces
//! a [`WorkerResponse`] or lets the request pass through untouched.

use serde_json::Value;

/// What a page request is fetching, as declared by the requester.
///
/// Documents, scripts, and stylesheets are the static-asset destinations;
/// everything else only matches the API predicate, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    Font,
    Other,
}

impl Destination {
    /// Whether this destination is served by the static cache layer.
    pub fn is_static(self) -> bool {
        matches!(self, Destination::Document | Destination::Script | Destination::Style)
    }
}

/// A request issued by a controlled page.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Full request URL, including query parameters.
    pub url: String,
    pub destination: Destination,
}

impl PageRequest {
    pub fn new(url: impl Into<String>, destination: Destination) -> Self {
        Self { url: url.into(), destination }
    }
}

/// A response substituted for an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl WorkerResponse {
    /// A 200 response carrying a JSON payload.
    pub fn json(data: &Value) -> Self {
        Self {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: data.to_string().into_bytes(),
        }
    }

    /// The substitute error body: `{"error": <message>}`.
    ///
    /// Served with the default status so the page always receives a
    /// parseable JSON response; callers must check the `error` field to
    /// tell a degraded result from real data.
    pub fn error(message: &str) -> Self {
        Self::json(&serde_json::json!({ "error": message }))
    }

    /// Decode the body as JSON.
    pub fn body_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
