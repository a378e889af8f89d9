//! Header allowlists and security response headers.
//!
//! # Responsibilities
//! - Build the upstream request header set from a fixed allowlist
//! - Derive X-Forwarded-For from the trusted client-IP header
//! - Reduce upstream response headers to a fixed allowlist
//! - Add security response headers to asset-served responses
//!
//! # Design Decisions
//! - Allowlists, not denylists: anything not named is dropped
//! - Never trust an inbound X-Forwarded-For; only the platform's client-IP header
//! - Lists are ordered so the upstream sees headers in a stable order

use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, ACCEPT_RANGES,
    CACHE_CONTROL, CONTENT_TYPE, DATE, ETAG, EXPIRES, LAST_MODIFIED, REFERER, REFERRER_POLICY,
    USER_AGENT, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION,
};

/// Diagnostic header reporting the edge cache outcome.
pub const CF_CACHE_STATUS: HeaderName = HeaderName::from_static("cf-cache-status");

/// Platform-supplied address of the connecting client.
pub const CF_CONNECTING_IP: HeaderName = HeaderName::from_static("cf-connecting-ip");

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

const FEATURE_POLICY: HeaderName = HeaderName::from_static("feature-policy");

/// Request headers copied onto the upstream request.
pub static FORWARDED_REQUEST_HEADERS: [HeaderName; 5] =
    [ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, REFERER, USER_AGENT];

/// Upstream response headers copied onto the client response.
pub static FORWARDED_RESPONSE_HEADERS: [HeaderName; 8] = [
    CONTENT_TYPE,
    CACHE_CONTROL,
    EXPIRES,
    ACCEPT_RANGES,
    DATE,
    LAST_MODIFIED,
    ETAG,
    CF_CACHE_STATUS,
];

/// Headers set on every response served from the asset store.
pub const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (X_XSS_PROTECTION, "1; mode=block"),
    (X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (X_FRAME_OPTIONS, "DENY"),
    (REFERRER_POLICY, "unsafe-url"),
    (FEATURE_POLICY, "none"),
];

/// Which headers may cross the proxy in each direction.
#[derive(Debug, Clone)]
pub struct ProxyHeaderPolicy {
    request: &'static [HeaderName],
    response: &'static [HeaderName],
    client_ip: HeaderName,
}

impl Default for ProxyHeaderPolicy {
    fn default() -> Self {
        Self::new(CF_CONNECTING_IP)
    }
}

impl ProxyHeaderPolicy {
    /// Policy with the fixed allowlists and the given trusted client-IP header.
    pub fn new(client_ip: HeaderName) -> Self {
        Self {
            request: &FORWARDED_REQUEST_HEADERS,
            response: &FORWARDED_RESPONSE_HEADERS,
            client_ip,
        }
    }

    /// Headers for the upstream request.
    ///
    /// Only allowlisted headers are copied; the client address, when the
    /// trusted header carries one, becomes `X-Forwarded-For`.
    pub fn outbound_headers(&self, inbound: &HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(self.request.len() + 1);
        copy_present(self.request, inbound, &mut headers);

        if let Some(addr) = non_empty(inbound.get(&self.client_ip)) {
            headers.insert(X_FORWARDED_FOR, addr.clone());
        }
        headers
    }

    /// Headers for the client response, before the cache policy is applied.
    pub fn inbound_headers(&self, upstream: &HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(self.response.len());
        copy_present(self.response, upstream, &mut headers);
        headers
    }
}

fn copy_present(names: &[HeaderName], from: &HeaderMap, to: &mut HeaderMap) {
    for name in names {
        if let Some(value) = joined(from, name) {
            to.insert(name.clone(), value);
        }
    }
}

// Repeated fields collapse into one comma-separated value.
fn joined(from: &HeaderMap, name: &HeaderName) -> Option<HeaderValue> {
    let mut values = from.get_all(name).iter().filter(|v| !v.is_empty());
    let first = values.next()?;

    let mut combined = first.as_bytes().to_vec();
    let mut sensitive = first.is_sensitive();
    for value in values {
        combined.extend_from_slice(b", ");
        combined.extend_from_slice(value.as_bytes());
        sensitive |= value.is_sensitive();
    }

    let mut value = HeaderValue::from_bytes(&combined).ok()?;
    value.set_sensitive(sensitive);
    Some(value)
}

// Empty values count as absent.
fn non_empty(value: Option<&HeaderValue>) -> Option<&HeaderValue> {
    value.filter(|v| !v.is_empty())
}

/// Add the security headers, replacing any existing values.
pub fn apply_security_headers(headers: &mut HeaderMap) {
    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
}
