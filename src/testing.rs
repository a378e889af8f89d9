//! Test doubles shared by unit tests.

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, Response, StatusCode, Uri},
};
use std::sync::{Arc, Mutex};

use crate::proxy::{FetchOptions, Upstream, UpstreamError};

type Recorded = (Method, Uri, HeaderMap);

/// Upstream that records every request and answers with a canned response.
#[derive(Clone)]
pub struct MockUpstream {
    reply: Arc<dyn Fn() -> Response<Body> + Send + Sync>,
    requests: Arc<Mutex<Vec<Recorded>>>,
    options: Arc<Mutex<Vec<FetchOptions>>>,
}

impl MockUpstream {
    pub fn ok(body: &'static str) -> Self {
        Self::with_response(move || {
            Response::builder()
                .status(StatusCode::OK)
                .body(Body::from(body))
                .unwrap()
        })
    }

    pub fn with_response<F>(reply: F) -> Self
    where
        F: Fn() -> Response<Body> + Send + Sync + 'static,
    {
        Self {
            reply: Arc::new(reply),
            requests: Arc::default(),
            options: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn options(&self) -> Vec<FetchOptions> {
        self.options.lock().unwrap().clone()
    }
}

impl Upstream for MockUpstream {
    async fn fetch(&self, request: Request<Body>, options: FetchOptions) -> Result<Response<Body>, UpstreamError> {
        let (parts, _) = request.into_parts();
        self.requests.lock().unwrap().push((parts.method, parts.uri, parts.headers));
        self.options.lock().unwrap().push(options);
        Ok((self.reply)())
    }
}
