//! Static site edge server with a sanitizing image mirror.

pub mod assets;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;
pub mod security;
pub mod site;

#[cfg(test)]
mod testing;

pub use assets::{AssetStore, KvAssetStore};
pub use config::EdgeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::{HyperUpstream, Upstream};
