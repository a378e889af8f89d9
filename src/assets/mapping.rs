//! Request-to-asset mapping.
//!
//! A mapper turns the inbound request into the request the store looks up.
//! The default resolves directory-like paths to their index document.

use std::sync::Arc;

use crate::assets::{AssetMapper, AssetRequest};

pub const DEFAULT_INDEX_DOCUMENT: &str = "index.html";

/// Default mapping: `/` → `/index.html`, `/blog` → `/blog/index.html`.
pub fn map_request_to_asset(request: &AssetRequest) -> AssetRequest {
    map_with_index(request, DEFAULT_INDEX_DOCUMENT)
}

/// Default mapping with a custom index document name.
pub fn map_with_index(request: &AssetRequest, index_document: &str) -> AssetRequest {
    let path = request.url.path();

    let mapped = if path.ends_with('/') {
        format!("{}{}", path, index_document)
    } else if !has_known_extension(path) {
        format!("{}/{}", path, index_document)
    } else {
        return request.clone();
    };

    let mut url = request.url.clone();
    url.set_path(&mapped);
    request.with_url(url)
}

// A path "looks like a file" when its extension maps to a content type.
fn has_known_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or(path);
    last.contains('.') && mime_guess::from_path(last).first().is_some()
}

/// Default index mapping, then remove `prefix` from the front of the path.
///
/// Lets a site deployed under `/docs` keep its files at the namespace root.
pub fn strip_prefix_mapper(prefix: impl Into<String>, index_document: impl Into<String>) -> AssetMapper {
    let prefix = prefix.into();
    let index_document = index_document.into();
    let prefix = prefix.trim_end_matches('/').to_string();

    Arc::new(move |request: &AssetRequest| {
        let mapped = map_with_index(request, &index_document);

        let stripped = match mapped.url.path().strip_prefix(prefix.as_str()) {
            Some("") => "/".to_string(),
            Some(rest) if rest.starts_with('/') => rest.to_string(),
            _ => return mapped,
        };

        let mut url = mapped.url.clone();
        url.set_path(&stripped);
        mapped.with_url(url)
    })
}

/// Maps every request to `document` at the request's own origin.
pub fn not_found_mapper(document: impl Into<String>) -> AssetMapper {
    let document = document.into();
    Arc::new(move |request: &AssetRequest| {
        let mut url = request.url.clone();
        url.set_path(&document);
        url.set_query(None);
        url.set_fragment(None);
        request.with_url(url)
    })
}
