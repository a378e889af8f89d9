//! Upstream mirroring subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound GET /<host>/<path>
//!     → routing decides Proxy { url }
//!     → ProxyHeaderPolicy::outbound_headers (allowlist + X-Forwarded-For)
//!     → upstream.rs (fetch, same method, empty body, cache hint)
//!     → ProxyHeaderPolicy::inbound_headers (allowlist)
//!     → Cache-Control forced to the configured policy
//!     → streamed back to the client
//! ```
//!
//! # Design Decisions
//! - Single attempt: a failed fetch becomes a 500 carrying the error text
//! - Status and reason phrase copied verbatim
//! - Body passes through untouched

pub mod upstream;

use axum::{
    body::Body,
    http::{header::CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue, Method, Request, Response, StatusCode, Uri},
    response::IntoResponse,
};

use crate::config::ProxyConfig;
use crate::observability::metrics;
use crate::security::headers::{ProxyHeaderPolicy, CF_CACHE_STATUS, CF_CONNECTING_IP};

pub use upstream::{FetchOptions, HyperUpstream, Upstream, UpstreamError};

const DEFAULT_CACHE_CONTROL: &str = "public, max-age=10";

/// Forwards mirrored requests upstream and sanitizes the exchange.
#[derive(Clone)]
pub struct Proxy<U> {
    upstream: U,
    policy: ProxyHeaderPolicy,
    cache_control: HeaderValue,
    fetch_options: FetchOptions,
}

impl<U: Upstream> Proxy<U> {
    pub fn new(upstream: U, config: &ProxyConfig) -> Self {
        let cache_control = HeaderValue::from_str(&config.cache_control).unwrap_or_else(|e| {
            tracing::warn!(
                cache_control = %config.cache_control,
                error = %e,
                fallback = DEFAULT_CACHE_CONTROL,
                "Invalid proxy.cache_control, using fallback"
            );
            HeaderValue::from_static(DEFAULT_CACHE_CONTROL)
        });
        let client_ip = HeaderName::from_bytes(config.client_ip_header.as_bytes()).unwrap_or_else(|e| {
            tracing::warn!(
                client_ip_header = %config.client_ip_header,
                error = %e,
                fallback = %CF_CONNECTING_IP,
                "Invalid proxy.client_ip_header, using fallback"
            );
            CF_CONNECTING_IP
        });

        Self {
            upstream,
            policy: ProxyHeaderPolicy::new(client_ip),
            cache_control,
            fetch_options: FetchOptions {
                cache_ttl: config.cache_ttl(),
            },
        }
    }

    /// Fetch `url` on behalf of the client. Never fails: fetch errors are
    /// answered with a 500 whose body is the error message.
    pub async fn forward(&self, url: &str, method: Method, inbound: &HeaderMap) -> Response<Body> {
        match self.try_forward(url, method, inbound).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Upstream fetch failed");
                metrics::record_upstream_error();
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }

    async fn try_forward(&self, url: &str, method: Method, inbound: &HeaderMap) -> Result<Response<Body>, UpstreamError> {
        let invalid = |reason: String| UpstreamError::InvalidUrl {
            url: url.to_string(),
            reason,
        };

        let uri: Uri = url.parse().map_err(|e: axum::http::uri::InvalidUri| invalid(e.to_string()))?;

        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(headers) = builder.headers_mut() {
            *headers = self.policy.outbound_headers(inbound);
        }
        let request = builder.body(Body::empty()).map_err(|e| invalid(e.to_string()))?;

        let response = self.upstream.fetch(request, self.fetch_options).await?;
        Ok(self.filter_response(url, response))
    }

    fn filter_response(&self, url: &str, upstream: Response<Body>) -> Response<Body> {
        let (parts, body) = upstream.into_parts();

        let mut headers = self.policy.inbound_headers(&parts.headers);
        headers.insert(CACHE_CONTROL, self.cache_control.clone());

        let cache_status = headers
            .get(CF_CACHE_STATUS)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info!(url = %url, status = %parts.status, cache_status = %cache_status, "Proxied");

        let mut response = Response::new(body);
        *response.status_mut() = parts.status;
        *response.headers_mut() = headers;
        if let Some(reason) = parts.extensions.get::<hyper::ext::ReasonPhrase>() {
            response.extensions_mut().insert(reason.clone());
        }
        response
    }
}
