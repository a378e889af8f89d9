//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the edge server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Development mode: bypasses the edge cache, disables the 404 fallback
    /// and exposes raw error messages in 500 responses.
    pub debug: bool,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Static site served from the asset store.
    pub site: SiteConfig,

    /// Mirrored upstream origin.
    pub proxy: ProxyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8787").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8787".to_string(),
        }
    }
}

/// Asset store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory holding the site's static files.
    pub root: String,

    /// Document served for directory-like paths.
    pub index_document: String,

    /// Document served with status 404 when a lookup fails.
    pub not_found_document: String,

    /// Path prefix removed before the asset key is computed (e.g. "/docs").
    pub strip_prefix: Option<String>,

    /// How long an asset stays in the edge cache, in seconds.
    pub edge_ttl_secs: u64,

    /// `max-age` advertised to browsers on asset responses, if any.
    pub browser_ttl_secs: Option<u64>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: "public".to_string(),
            index_document: "index.html".to_string(),
            not_found_document: "/404.html".to_string(),
            strip_prefix: None,
            edge_ttl_secs: 2 * 24 * 60 * 60,
            browser_ttl_secs: None,
        }
    }
}

impl SiteConfig {
    pub fn edge_ttl(&self) -> Duration {
        Duration::from_secs(self.edge_ttl_secs)
    }
}

/// Upstream mirroring configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Requests whose path starts with this prefix are proxied.
    /// The prefix doubles as the upstream host (`/<host>/`).
    pub path_prefix: String,

    /// Prepended to the request path to form the upstream URL.
    pub scheme_fragment: String,

    /// File extension removed from the end of proxied paths.
    pub strip_suffix: String,

    /// `Cache-Control` value forced onto every proxied response.
    pub cache_control: String,

    /// Revalidation interval hinted to the upstream fetch, in seconds.
    pub cache_ttl_secs: u64,

    /// Trusted header carrying the connecting client's address.
    pub client_ip_header: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            path_prefix: "/api.nvseismolab.org/".to_string(),
            scheme_fragment: "http:/".to_string(),
            strip_suffix: ".jpg".to_string(),
            cache_control: "public, max-age=10".to_string(),
            cache_ttl_secs: 10,
            client_ip_header: "cf-connecting-ip".to_string(),
        }
    }
}

impl ProxyConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
