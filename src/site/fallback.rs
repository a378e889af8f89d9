//! Not-found document fallback.

use axum::http::StatusCode;

use crate::assets::{AssetMapper, AssetRequest, AssetResponse, AssetStore, LookupOptions};

/// Look up the not-found document for `request` and re-status it as 404.
///
/// Returns `None` when the document itself cannot be served. Its own error is
/// only logged; the caller reports the original failure.
pub async fn not_found_page<S: AssetStore>(
    store: &S,
    request: &AssetRequest,
    mapper: &AssetMapper,
) -> Option<AssetResponse> {
    let options = LookupOptions {
        map_request_to_asset: Some(mapper.clone()),
        bypass_cache: false,
    };

    match store.get_asset(request, &options).await {
        Ok(mut page) => {
            page.status = StatusCode::NOT_FOUND;
            Some(page)
        }
        Err(e) => {
            tracing::debug!(url = %request.url, error = %e, "Not-found document unavailable");
            None
        }
    }
}
