//! Key-value backed asset store with an edge cache.
//!
//! # Responsibilities
//! - Derive the asset key from the mapped request path
//! - Serve GET/HEAD only
//! - Keep recently read assets in a TTL-bounded edge cache
//! - Attach content type, ETag and browser cache headers
//! - Answer matching `If-None-Match` with 304
//!
//! # Design Decisions
//! - Namespace is either a directory on disk or an in-memory map
//! - Edge cache entries are immutable; a stale entry is replaced on the next miss
//! - ETag is derived from the content, so it is stable across restarts

use axum::{
    body::Bytes,
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_NONE_MATCH},
        HeaderMap, HeaderValue, Method, StatusCode,
    },
};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::assets::mapping::{map_with_index, DEFAULT_INDEX_DOCUMENT};
use crate::assets::{AssetError, AssetRequest, AssetResponse, AssetStore, LookupOptions};
use crate::security::headers::CF_CACHE_STATUS;

/// Where asset bytes live.
#[derive(Debug, Clone)]
enum Namespace {
    Directory(PathBuf),
    Memory(Arc<DashMap<String, Bytes>>),
}

#[derive(Debug, Clone)]
struct StoredAsset {
    body: Bytes,
    etag: HeaderValue,
}

#[derive(Debug, Clone)]
struct CachedAsset {
    asset: StoredAsset,
    inserted: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheOutcome {
    Hit,
    Miss,
    Bypass,
}

impl CacheOutcome {
    fn as_header(self) -> HeaderValue {
        HeaderValue::from_static(match self {
            CacheOutcome::Hit => "HIT",
            CacheOutcome::Miss => "MISS",
            CacheOutcome::Bypass => "BYPASS",
        })
    }
}

/// Static asset store.
#[derive(Debug, Clone)]
pub struct KvAssetStore {
    namespace: Namespace,
    edge_cache: Arc<DashMap<String, CachedAsset>>,
    edge_ttl: Duration,
    browser_ttl: Option<Duration>,
    index_document: String,
}

impl KvAssetStore {
    /// Store backed by the files under `root`.
    pub fn from_dir(root: impl AsRef<Path>) -> Self {
        Self::with_namespace(Namespace::Directory(root.as_ref().to_path_buf()))
    }

    /// Empty store held in memory; populate with [`KvAssetStore::insert`].
    pub fn in_memory() -> Self {
        Self::with_namespace(Namespace::Memory(Arc::new(DashMap::new())))
    }

    fn with_namespace(namespace: Namespace) -> Self {
        Self {
            namespace,
            edge_cache: Arc::new(DashMap::new()),
            edge_ttl: Duration::from_secs(2 * 24 * 60 * 60),
            browser_ttl: None,
            index_document: DEFAULT_INDEX_DOCUMENT.to_string(),
        }
    }

    pub fn edge_ttl(mut self, ttl: Duration) -> Self {
        self.edge_ttl = ttl;
        self
    }

    pub fn browser_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.browser_ttl = ttl;
        self
    }

    pub fn index_document(mut self, document: impl Into<String>) -> Self {
        self.index_document = document.into();
        self
    }

    /// Put an asset into an in-memory namespace. Ignored for directories.
    pub fn insert(&self, key: impl Into<String>, body: impl Into<Bytes>) {
        match &self.namespace {
            Namespace::Memory(map) => {
                let key = key.into();
                self.edge_cache.remove(&key);
                map.insert(key, body.into());
            }
            Namespace::Directory(root) => {
                tracing::warn!(root = %root.display(), "insert ignored for directory namespace");
            }
        }
    }

    /// Number of assets currently held in the edge cache.
    pub fn cached_len(&self) -> usize {
        self.edge_cache.len()
    }

    async fn read(&self, key: &str) -> Result<StoredAsset, AssetError> {
        let body = match &self.namespace {
            Namespace::Memory(map) => {
                let found = map.get(key).map(|entry| entry.value().clone());
                found.ok_or_else(|| AssetError::NotFound { key: key.to_string() })?
            }
            Namespace::Directory(root) => match tokio::fs::read(root.join(key)).await {
                Ok(bytes) => Bytes::from(bytes),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(AssetError::NotFound { key: key.to_string() });
                }
                Err(source) => {
                    return Err(AssetError::Storage {
                        key: key.to_string(),
                        source,
                    });
                }
            },
        };

        Ok(StoredAsset {
            etag: content_etag(&body),
            body,
        })
    }

    fn cached(&self, key: &str) -> Option<StoredAsset> {
        let entry = self.edge_cache.get(key)?;
        if entry.inserted.elapsed() < self.edge_ttl {
            Some(entry.asset.clone())
        } else {
            None
        }
    }

    async fn load(&self, key: &str, bypass_cache: bool) -> Result<(StoredAsset, CacheOutcome), AssetError> {
        if bypass_cache {
            return Ok((self.read(key).await?, CacheOutcome::Bypass));
        }
        if let Some(asset) = self.cached(key) {
            return Ok((asset, CacheOutcome::Hit));
        }

        let asset = self.read(key).await?;
        self.edge_cache.insert(
            key.to_string(),
            CachedAsset {
                asset: asset.clone(),
                inserted: Instant::now(),
            },
        );
        Ok((asset, CacheOutcome::Miss))
    }

    fn response_headers(&self, key: &str, asset: &StoredAsset, outcome: CacheOutcome) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, content_type(key));
        headers.insert(ETAG, asset.etag.clone());
        headers.insert(CF_CACHE_STATUS, outcome.as_header());
        if let Some(ttl) = self.browser_ttl {
            if let Ok(value) = HeaderValue::from_str(&format!("max-age={}", ttl.as_secs())) {
                headers.insert(CACHE_CONTROL, value);
            }
        }
        headers
    }
}

impl AssetStore for KvAssetStore {
    async fn get_asset(&self, request: &AssetRequest, options: &LookupOptions) -> Result<AssetResponse, AssetError> {
        let mapped = match &options.map_request_to_asset {
            Some(mapper) => mapper(request),
            None => map_with_index(request, &self.index_document),
        };

        if mapped.method != Method::GET && mapped.method != Method::HEAD {
            return Err(AssetError::MethodNotAllowed(mapped.method));
        }

        let key = asset_key(mapped.url.path())?;
        let (asset, outcome) = self.load(&key, options.bypass_cache).await?;
        let headers = self.response_headers(&key, &asset, outcome);

        tracing::debug!(key = %key, cache = ?outcome, "Asset resolved");

        let not_modified = mapped
            .headers
            .get(IF_NONE_MATCH)
            .map(|tag| *tag == asset.etag)
            .unwrap_or(false);

        let (status, body) = if not_modified {
            (StatusCode::NOT_MODIFIED, Bytes::new())
        } else if mapped.method == Method::HEAD {
            (StatusCode::OK, Bytes::new())
        } else {
            (StatusCode::OK, asset.body)
        };

        Ok(AssetResponse { status, headers, body })
    }
}

/// Namespace key for a request path: no leading slash, no parent segments.
fn asset_key(path: &str) -> Result<String, AssetError> {
    let key = path.trim_start_matches('/');
    if key.is_empty() || key.split('/').any(|segment| segment == "..") {
        return Err(AssetError::NotFound { key: key.to_string() });
    }
    Ok(key.to_string())
}

fn content_type(key: &str) -> HeaderValue {
    let mime = mime_guess::from_path(key).first_or_octet_stream();
    let value = if mime.type_() == "text" && mime.get_param("charset").is_none() {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.to_string()
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}

fn content_etag(body: &[u8]) -> HeaderValue {
    let digest = Sha256::digest(body);
    let tag = format!("\"{}\"", hex::encode(&digest[..16]));
    HeaderValue::from_str(&tag).unwrap_or_else(|_| HeaderValue::from_static("\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::mapping::strip_prefix_mapper;
    use url::Url;

    fn request(method: Method, url: &str) -> AssetRequest {
        AssetRequest::new(method, Url::parse(url).unwrap())
    }

    fn store() -> KvAssetStore {
        let store = KvAssetStore::in_memory();
        store.insert("index.html", "<h1>home</h1>");
        store.insert("about.html", "<h1>about</h1>");
        store.insert("img/logo.png", vec![0x89, b'P', b'N', b'G']);
        store
    }

    #[tokio::test]
    async fn test_serves_index_for_root() {
        let res = store()
            .get_asset(&request(Method::GET, "http://site.example/"), &LookupOptions::default())
            .await
            .unwrap();

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body, Bytes::from("<h1>home</h1>"));
        assert_eq!(res.headers[CONTENT_TYPE], "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn test_binary_content_type() {
        let res = store()
            .get_asset(&request(Method::GET, "http://site.example/img/logo.png"), &LookupOptions::default())
            .await
            .unwrap();
        assert_eq!(res.headers[CONTENT_TYPE], "image/png");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let err = store()
            .get_asset(&request(Method::GET, "http://site.example/missing.html"), &LookupOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AssetError::NotFound { ref key } if key == "missing.html"));
        assert_eq!(err.to_string(), "could not find missing.html in your content namespace");
    }

    #[tokio::test]
    async fn test_rejects_other_methods() {
        let err = store()
            .get_asset(&request(Method::POST, "http://site.example/about.html"), &LookupOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::MethodNotAllowed(Method::POST)));
    }

    #[tokio::test]
    async fn test_head_has_headers_but_no_body() {
        let res = store()
            .get_asset(&request(Method::HEAD, "http://site.example/about.html"), &LookupOptions::default())
            .await
            .unwrap();
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body.is_empty());
        assert!(res.headers.contains_key(ETAG));
    }

    #[test]
    fn test_asset_key_rejects_parent_segments() {
        assert!(matches!(asset_key("/../etc/passwd"), Err(AssetError::NotFound { .. })));
        assert!(matches!(asset_key("/"), Err(AssetError::NotFound { .. })));
        assert_eq!(asset_key("/img/logo.png").unwrap(), "img/logo.png");
    }

    #[tokio::test]
    async fn test_edge_cache_hit_and_bypass() {
        let store = store();
        let req = request(Method::GET, "http://site.example/about.html");

        let first = store.get_asset(&req, &LookupOptions::default()).await.unwrap();
        let second = store.get_asset(&req, &LookupOptions::default()).await.unwrap();
        let bypass = LookupOptions {
            bypass_cache: true,
            ..Default::default()
        };
        let third = store.get_asset(&req, &bypass).await.unwrap();

        assert_eq!(first.headers[CF_CACHE_STATUS], "MISS");
        assert_eq!(second.headers[CF_CACHE_STATUS], "HIT");
        assert_eq!(third.headers[CF_CACHE_STATUS], "BYPASS");
        assert_eq!(store.cached_len(), 1);
    }

    #[tokio::test]
    async fn test_bypass_does_not_populate_cache() {
        let store = store();
        let bypass = LookupOptions {
            bypass_cache: true,
            ..Default::default()
        };
        store
            .get_asset(&request(Method::GET, "http://site.example/about.html"), &bypass)
            .await
            .unwrap();
        assert_eq!(store.cached_len(), 0);
    }

    #[tokio::test]
    async fn test_expired_entry_is_reloaded() {
        let store = store().edge_ttl(Duration::ZERO);
        let req = request(Method::GET, "http://site.example/about.html");

        store.get_asset(&req, &LookupOptions::default()).await.unwrap();
        let again = store.get_asset(&req, &LookupOptions::default()).await.unwrap();
        assert_eq!(again.headers[CF_CACHE_STATUS], "MISS");
    }

    #[tokio::test]
    async fn test_if_none_match_yields_not_modified() {
        let store = store();
        let req = request(Method::GET, "http://site.example/about.html");
        let first = store.get_asset(&req, &LookupOptions::default()).await.unwrap();

        let mut conditional = req.clone();
        conditional.headers.insert(IF_NONE_MATCH, first.headers[ETAG].clone());
        let res = store.get_asset(&conditional, &LookupOptions::default()).await.unwrap();

        assert_eq!(res.status, StatusCode::NOT_MODIFIED);
        assert!(res.body.is_empty());
    }

    #[tokio::test]
    async fn test_browser_ttl_sets_cache_control() {
        let store = store().browser_ttl(Some(Duration::from_secs(60)));
        let res = store
            .get_asset(&request(Method::GET, "http://site.example/about.html"), &LookupOptions::default())
            .await
            .unwrap();
        assert_eq!(res.headers[CACHE_CONTROL], "max-age=60");
    }

    #[tokio::test]
    async fn test_custom_mapper_is_used() {
        let store = store();
        let options = LookupOptions {
            map_request_to_asset: Some(strip_prefix_mapper("/docs", "index.html")),
            bypass_cache: false,
        };
        let res = store
            .get_asset(&request(Method::GET, "http://site.example/docs/about.html"), &options)
            .await
            .unwrap();
        assert_eq!(res.body, Bytes::from("<h1>about</h1>"));
    }

    #[tokio::test]
    async fn test_directory_namespace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "from disk").unwrap();

        let store = KvAssetStore::from_dir(dir.path());
        let res = store
            .get_asset(&request(Method::GET, "http://site.example/"), &LookupOptions::default())
            .await
            .unwrap();
        assert_eq!(res.body, Bytes::from("from disk"));

        let err = store
            .get_asset(&request(Method::GET, "http://site.example/nope.css"), &LookupOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::NotFound { .. }));
    }
}
