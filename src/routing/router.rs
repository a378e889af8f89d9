//! Request disposition.
//!
//! # Responsibilities
//! - Decide whether a request is mirrored upstream or served from assets
//! - Build the absolute upstream URL for mirrored requests
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Explicit disposition rather than a silent default
//! - Only the configured suffix is stripped; other extensions pass through

use axum::http::{request::Parts, Method};

use crate::config::ProxyConfig;
use crate::routing::matcher::{AndMatcher, Matcher, MethodMatcher, PathPrefixMatcher};

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Fetch from the mirrored origin at `url`.
    Proxy { url: String },
    /// Look up in the asset store.
    Asset,
}

impl Disposition {
    /// Label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Disposition::Proxy { .. } => "proxy",
            Disposition::Asset => "asset",
        }
    }
}

/// Compiled routing rules.
#[derive(Debug)]
pub struct Router {
    mirror: AndMatcher,
    scheme_fragment: String,
    strip_suffix: String,
}

impl Router {
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            mirror: AndMatcher::new(vec![
                Box::new(MethodMatcher::new(Method::GET)),
                Box::new(PathPrefixMatcher::new(config.path_prefix.clone())),
            ]),
            scheme_fragment: config.scheme_fragment.clone(),
            strip_suffix: config.strip_suffix.clone(),
        }
    }

    pub fn route(&self, req: &Parts) -> Disposition {
        if self.mirror.matches(req) {
            Disposition::Proxy {
                url: upstream_url(&self.scheme_fragment, req.uri.path(), &self.strip_suffix),
            }
        } else {
            Disposition::Asset
        }
    }
}

/// `scheme_fragment` + `path`, minus a trailing `suffix` and surrounding
/// whitespace. The query string is not carried over.
pub fn upstream_url(scheme_fragment: &str, path: &str, suffix: &str) -> String {
    let trimmed = path.trim();
    let stripped = if suffix.is_empty() {
        trimmed
    } else {
        trimmed.strip_suffix(suffix).unwrap_or(trimmed).trim()
    };
    format!("{}{}", scheme_fragment, stripped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(method: Method, uri: &str) -> Parts {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_mirrored_get_is_proxied() {
        let router = Router::from_config(&ProxyConfig::default());

        assert_eq!(
            router.route(&parts(Method::GET, "/api.nvseismolab.org/cam1.jpg")),
            Disposition::Proxy {
                url: "http://api.nvseismolab.org/cam1".into()
            }
        );
    }

    #[test]
    fn test_query_is_dropped_and_other_extensions_kept() {
        let router = Router::from_config(&ProxyConfig::default());

        assert_eq!(
            router.route(&parts(Method::GET, "/api.nvseismolab.org/webcams/cam2.png?t=1")),
            Disposition::Proxy {
                url: "http://api.nvseismolab.org/webcams/cam2.png".into()
            }
        );
    }

    #[test]
    fn test_non_get_goes_to_assets() {
        let router = Router::from_config(&ProxyConfig::default());

        for method in [Method::HEAD, Method::POST, Method::PUT] {
            assert_eq!(router.route(&parts(method, "/api.nvseismolab.org/cam1.jpg")), Disposition::Asset);
        }
    }

    #[test]
    fn test_other_paths_go_to_assets() {
        let router = Router::from_config(&ProxyConfig::default());

        assert_eq!(router.route(&parts(Method::GET, "/about.html")), Disposition::Asset);
        assert_eq!(router.route(&parts(Method::GET, "/")), Disposition::Asset);
        assert_eq!(router.route(&parts(Method::GET, "/api.nvseismolab.org")), Disposition::Asset);
    }

    #[test]
    fn test_upstream_url_trims_suffix_and_whitespace() {
        assert_eq!(upstream_url("http:/", "/h.org/a.jpg", ".jpg"), "http://h.org/a");
        assert_eq!(upstream_url("http:/", " /h.org/a .jpg ", ".jpg"), "http://h.org/a");
        assert_eq!(upstream_url("http:/", "/h.org/a.jpg.jpg", ".jpg"), "http://h.org/a.jpg");
        assert_eq!(upstream_url("https:/", "/h.org/a.jpeg", ".jpg"), "https://h.org/a.jpeg");
        assert_eq!(upstream_url("http:/", "/h.org/a.jpg", ""), "http://h.org/a.jpg");
    }
}
