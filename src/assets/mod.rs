//! Asset store subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → AssetRequest (absolute URL + method + headers)
//!     → mapping.rs (request → asset key: "/" → "/index.html", prefix strip)
//!     → AssetStore::get_asset (kv.rs: edge cache → namespace)
//!     → AssetResponse (status, headers, body) | AssetError
//! ```
//!
//! # Design Decisions
//! - The store is a trait so the site handler never sees a concrete backend
//! - Mapping is a caller-supplied closure, defaulting to index resolution
//! - Lookup failures are typed; the caller decides how to recover

pub mod kv;
pub mod mapping;

use axum::{
    body::{Body, Bytes},
    http::{request, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::sync::Arc;
use url::Url;

pub use kv::KvAssetStore;
pub use mapping::{map_request_to_asset, not_found_mapper, strip_prefix_mapper};

/// Rewrites a request before the asset key is derived from its path.
pub type AssetMapper = Arc<dyn Fn(&AssetRequest) -> AssetRequest + Send + Sync>;

/// A request as seen by the asset store.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

impl AssetRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
        }
    }

    /// Rebuild the absolute URL of an inbound request.
    ///
    /// Servers receive origin-form targets (`/path?query`), so the authority
    /// comes from the `Host` header when the URI has none.
    pub fn from_parts(parts: &request::Parts) -> Result<Self, AssetError> {
        let scheme = parts.uri.scheme_str().unwrap_or("http");
        let host = parts
            .uri
            .authority()
            .map(|a| a.as_str())
            .or_else(|| parts.headers.get("host").and_then(|h| h.to_str().ok()))
            .unwrap_or("localhost");
        let path = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

        let raw = format!("{}://{}{}", scheme, host, path);
        let url = Url::parse(&raw).map_err(|e| AssetError::InvalidUrl(format!("{}: {}", raw, e)))?;

        Ok(Self {
            method: parts.method.clone(),
            url,
            headers: parts.headers.clone(),
        })
    }

    /// Same method and headers, different target.
    pub fn with_url(&self, url: Url) -> Self {
        Self {
            method: self.method.clone(),
            url,
            headers: self.headers.clone(),
        }
    }

    /// `scheme://host[:port]` of the request URL.
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }
}

/// Options for a single lookup.
#[derive(Clone, Default)]
pub struct LookupOptions {
    /// Request-to-key mapping. `None` uses the store's default index mapping.
    pub map_request_to_asset: Option<AssetMapper>,
    /// Skip the edge cache for both reads and writes.
    pub bypass_cache: bool,
}

impl std::fmt::Debug for LookupOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupOptions")
            .field("map_request_to_asset", &self.map_request_to_asset.is_some())
            .field("bypass_cache", &self.bypass_cache)
            .finish()
    }
}

/// A stored asset ready to be sent.
#[derive(Debug, Clone)]
pub struct AssetResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for AssetResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Asset lookup failure.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("could not find {key} in your content namespace")]
    NotFound { key: String },

    #[error("{0} is not a valid request method")]
    MethodNotAllowed(Method),

    #[error("invalid request url {0}")]
    InvalidUrl(String),

    #[error("failed to read {key}: {source}")]
    Storage {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves requests to stored static files.
pub trait AssetStore: Send + Sync + 'static {
    fn get_asset(
        &self,
        request: &AssetRequest,
        options: &LookupOptions,
    ) -> impl Future<Output = Result<AssetResponse, AssetError>> + Send;
}

impl<T: AssetStore> AssetStore for Arc<T> {
    fn get_asset(
        &self,
        request: &AssetRequest,
        options: &LookupOptions,
    ) -> impl Future<Output = Result<AssetResponse, AssetError>> + Send {
        (**self).get_asset(request, options)
    }
}
