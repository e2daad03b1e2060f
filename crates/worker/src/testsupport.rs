//! Scripted in-memory upstream for worker tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use intercept_client::{FetchResponse, StatusCode, Upstream};
use intercept_core::Error;

#[derive(Clone)]
enum Route {
    Respond { status: u16, content_type: Option<String>, body: Vec<u8> },
    Fail,
}

/// An [`Upstream`] over a routing table, recording every fetched URL.
#[derive(Default)]
pub struct MockUpstream {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for a URL.
    pub fn insert(&self, url: &str, status: u16, content_type: Option<&str>, body: Vec<u8>) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Route::Respond { status, content_type: content_type.map(str::to_string), body },
        );
    }

    /// Script a 200 application/json response for a URL.
    pub fn insert_json(&self, url: &str, data: &serde_json::Value) {
        self.insert(url, 200, Some("application/json"), data.to_string().into_bytes());
    }

    /// Script a network-level failure for a URL.
    pub fn fail(&self, url: &str) {
        self.routes.lock().unwrap().insert(url.to_string(), Route::Fail);
    }

    /// URLs fetched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, Error> {
        self.calls.lock().unwrap().push(url.to_string());

        let route = self.routes.lock().unwrap().get(url).cloned();
        match route {
            Some(Route::Respond { status, content_type, body }) => Ok(FetchResponse {
                url: url.to_string(),
                status: StatusCode::from_u16(status).unwrap(),
                content_type,
                bytes: Bytes::from(body),
                fetch_ms: 0,
            }),
            Some(Route::Fail) => Err(Error::Http(format!("network error: connection refused: {url}"))),
            None => Err(Error::Http(format!("network error: no route for {url}"))),
        }
    }
}
