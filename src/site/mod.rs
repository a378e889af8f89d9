//! Static site serving.
//!
//! # Data Flow
//! ```text
//! AssetRequest
//!     → AssetStore::get_asset (bypassing the edge cache in debug mode)
//!     → Ok: security headers added → response
//!     → Err (debug):     500 with the error message
//!     → Err (otherwise): fallback.rs → 404 document
//!                        → unavailable: 500 with the original error message
//! ```

pub mod fallback;

use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};

use crate::assets::{not_found_mapper, strip_prefix_mapper, AssetMapper, AssetRequest, AssetStore, LookupOptions};
use crate::config::EdgeConfig;
use crate::observability::metrics;
use crate::security::headers::apply_security_headers;

/// Serves assets and recovers lookup failures.
pub struct Site<S> {
    store: S,
    debug: bool,
    mapper: Option<AssetMapper>,
    not_found: AssetMapper,
}

impl<S: AssetStore> Site<S> {
    pub fn new(store: S, config: &EdgeConfig) -> Self {
        let mapper = config
            .site
            .strip_prefix
            .as_ref()
            .map(|prefix| strip_prefix_mapper(prefix.clone(), config.site.index_document.clone()));

        Self {
            store,
            debug: config.debug,
            mapper,
            not_found: not_found_mapper(config.site.not_found_document.clone()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn serve(&self, request: &AssetRequest) -> Response<Body> {
        let options = LookupOptions {
            map_request_to_asset: self.mapper.clone(),
            bypass_cache: self.debug,
        };

        let err = match self.store.get_asset(request, &options).await {
            Ok(asset) => {
                let mut response = asset.into_response();
                apply_security_headers(response.headers_mut());
                return response;
            }
            Err(e) => e,
        };

        tracing::warn!(url = %request.url, error = %err, "Asset lookup failed");

        if !self.debug {
            if let Some(page) = fallback::not_found_page(&self.store, request, &self.not_found).await {
                metrics::record_fallback("served");
                return page.into_response();
            }
            metrics::record_fallback("unavailable");
        }

        (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
    }
}
