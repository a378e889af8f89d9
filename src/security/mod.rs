//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Proxied request:
//!     → headers.rs (request allowlist, X-Forwarded-For)
//!     → upstream
//!     → headers.rs (response allowlist)
//!
//! Asset response:
//!     → headers.rs (security headers)
//! ```
//!
//! # Design Decisions
//! - Nothing crosses the proxy unless named
//! - No trust in client-supplied forwarding headers

pub mod headers;
