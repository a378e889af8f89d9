//! Upstream fetch.
//!
//! # Responsibilities
//! - Define the fetch seam the proxy talks to
//! - Provide the hyper-based client used in production
//! - Hand the upstream body back as a stream, never buffered
//! - Decode gzip/deflate/br/zstd content codings on the way through

use axum::{
    body::Body,
    http::{Request, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::future::Future;
use std::time::Duration;
use tower::ServiceExt;
use tower_http::decompression::Decompression;

/// Per-fetch hints.
///
/// Advisory only: the hint is logged with the fetch and left to whatever
/// cache sits in front of the upstream. Nothing here enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// How long an intermediate cache may serve the upstream response
    /// before revalidating it.
    pub cache_ttl: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(10),
        }
    }
}

/// Upstream fetch failure.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("invalid upstream url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("upstream request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },
}

/// Performs the outbound HTTP exchange.
pub trait Upstream: Clone + Send + Sync + 'static {
    fn fetch(
        &self,
        request: Request<Body>,
        options: FetchOptions,
    ) -> impl Future<Output = Result<Response<Body>, UpstreamError>> + Send;
}

/// Upstream client over plain HTTP.
///
/// Encoded responses are decoded before they reach the proxy, whose
/// response allowlist does not carry `Content-Encoding`.
#[derive(Clone)]
pub struct HyperUpstream {
    client: Decompression<Client<HttpConnector, Body>>,
}

impl Default for HyperUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperUpstream {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client: Decompression::new(client),
        }
    }
}

impl Upstream for HyperUpstream {
    async fn fetch(&self, request: Request<Body>, options: FetchOptions) -> Result<Response<Body>, UpstreamError> {
        let url = request.uri().to_string();
        tracing::debug!(
            url = %url,
            method = %request.method(),
            cache_ttl_secs = options.cache_ttl.as_secs(),
            "Fetching upstream"
        );

        let response = self
            .client
            .clone()
            .oneshot(request)
            .await
            .map_err(|source| UpstreamError::Request { url, source })?;

        // Decoded as it streams, never collected.
        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
