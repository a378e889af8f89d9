//! Configuration validation.
//!
//! Serde handles the syntactic side; this module checks values that parse but
//! cannot work (unparseable addresses, malformed prefixes, header values that
//! would be rejected at response time).
//!
//! All errors are collected, not just the first.

use axum::http::HeaderValue;
use std::net::SocketAddr;

use crate::config::schema::EdgeConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid {field}: {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("proxy.path_prefix {0:?} must start and end with '/'")]
    InvalidPathPrefix(String),

    #[error("proxy.scheme_fragment {0:?} must be \"http:/\" or \"https:/\"")]
    InvalidSchemeFragment(String),

    #[error("proxy.cache_control {0:?} is not a usable header value")]
    InvalidCacheControl(String),

    #[error("proxy.client_ip_header {0:?} is not a valid header name")]
    InvalidClientIpHeader(String),

    #[error("{field} {value:?} must start with '/'")]
    NotAbsolutePath { field: &'static str, value: String },

    #[error("site.root must not be empty")]
    EmptySiteRoot,
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    let proxy = &config.proxy;
    if !proxy.path_prefix.starts_with('/') || !proxy.path_prefix.ends_with('/') || proxy.path_prefix.len() < 2 {
        errors.push(ValidationError::InvalidPathPrefix(proxy.path_prefix.clone()));
    }
    if proxy.scheme_fragment != "http:/" && proxy.scheme_fragment != "https:/" {
        errors.push(ValidationError::InvalidSchemeFragment(proxy.scheme_fragment.clone()));
    }
    if proxy.cache_control.trim().is_empty() || HeaderValue::from_str(&proxy.cache_control).is_err() {
        errors.push(ValidationError::InvalidCacheControl(proxy.cache_control.clone()));
    }
    if axum::http::HeaderName::from_bytes(proxy.client_ip_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidClientIpHeader(proxy.client_ip_header.clone()));
    }

    let site = &config.site;
    if site.root.trim().is_empty() {
        errors.push(ValidationError::EmptySiteRoot);
    }
    if !site.not_found_document.starts_with('/') {
        errors.push(ValidationError::NotAbsolutePath {
            field: "site.not_found_document",
            value: site.not_found_document.clone(),
        });
    }
    if let Some(prefix) = &site.strip_prefix {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::NotAbsolutePath {
                field: "site.strip_prefix",
                value: prefix.clone(),
            });
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&EdgeConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = EdgeConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.proxy.path_prefix = "api.example.org".into();
        config.proxy.scheme_fragment = "ftp:/".into();
        config.proxy.cache_control = "public\n".into();
        config.site.not_found_document = "404.html".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::InvalidPathPrefix("api.example.org".into())));
        assert!(errors.contains(&ValidationError::InvalidSchemeFragment("ftp:/".into())));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = EdgeConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidAddress {
                field: "observability.metrics_address",
                value: "nowhere".into(),
            }]
        );
    }
}
