//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (disposition lookup)
//!     → matcher.rs (evaluate GET + mirrored-prefix conditions)
//!     → Return: Proxy { upstream url } or Asset
//!
//! Compilation (at startup):
//!     ProxyConfig
//!     → Compile matchers
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always yields the same disposition

pub mod matcher;
pub mod router;

pub use router::{Disposition, Router};
