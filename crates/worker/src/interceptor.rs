//! Request interception and dispatch.
//!
//! Classifies every outgoing page request with two independent predicates:
//! static-asset destinations go cache-first against the current static
//! generation, API-prefixed paths go through the cache-aside read path.
//! Requests matching neither pass through untouched.

use url::Url;

use crate::lifecycle::Worker;
use crate::request::{PageRequest, WorkerResponse};

/// Outcome of intercepting one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intercept {
    /// Substitute this response for the request.
    Respond(WorkerResponse),
    /// The worker does not handle this request; the page fetches it itself.
    PassThrough,
}

/// Path component of a request URL, for prefix classification.
///
/// Accepts absolute URLs and root-relative paths; anything else is
/// unclassifiable and falls through.
fn request_path(url: &str) -> Option<String> {
    match Url::parse(url) {
        Ok(parsed) => Some(parsed.path().to_string()),
        Err(_) if url.starts_with('/') => {
            let path = url.split('?').next().unwrap_or(url);
            Some(path.to_string())
        }
        Err(_) => None,
    }
}

impl Worker {
    /// Intercept one page request.
    ///
    /// Both predicates are evaluated independently; when a request matches
    /// both (an API path with a static destination), the API branch wins,
    /// as the later-registered handler did in the source design.
    pub async fn on_request(&self, request: &PageRequest) -> Intercept {
        let mut decision = Intercept::PassThrough;

        if request.destination.is_static() {
            decision = self.serve_static(request).await;
        }

        let is_api = request_path(&request.url).is_some_and(|path| path.starts_with(&self.config().api_prefix));
        if is_api {
            tracing::debug!(url = %request.url, "intercepting API request");
            decision = Intercept::Respond(self.resolve(&request.url).await);
        }

        decision
    }

    /// Cache-first static asset policy.
    ///
    /// An exact path match in the current generation is returned verbatim.
    /// On miss the request goes to the network and the result is returned
    /// directly without being written back into the static cache. A failed
    /// fallback fetch degrades to pass-through, which fails in the page
    /// the same way the direct fetch would have.
    async fn serve_static(&self, request: &PageRequest) -> Intercept {
        let Some(path) = request_path(&request.url) else {
            return Intercept::PassThrough;
        };

        let cache_name = self.config().static_cache_name();
        match self.db().get_asset(&cache_name, &path).await {
            Ok(Some(asset)) => {
                tracing::debug!(path = %path, "static cache hit");
                return Intercept::Respond(WorkerResponse {
                    status: 200,
                    content_type: asset.content_type,
                    body: asset.body,
                });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "static cache lookup failed, falling back to network");
            }
        }

        match self.upstream().fetch(&request.url).await {
            Ok(response) => Intercept::Respond(WorkerResponse {
                status: response.status.as_u16(),
                content_type: response.content_type,
                body: response.bytes.to_vec(),
            }),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "static fallback fetch failed");
                Intercept::PassThrough
            }
        }
    }
}
