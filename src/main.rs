//! site-edge
//!
//! Serves a static site from a key-value asset store and mirrors one upstream
//! image origin through a header allowlist.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────┐
//!   Client Request         │                  SITE-EDGE                   │
//!   ───────────────────────┼─▶ http server ─▶ routing ─┬─▶ proxy ─────────┼──▶ Upstream
//!                          │   (request id,            │   (allowlists,    │    origin
//!                          │    trace, panics)         │    cache policy)  │
//!                          │                           │                   │
//!                          │                           └─▶ site ──────────┼──▶ Asset store
//!                          │                               (security hdrs, │    (edge cache)
//!   Client Response        │                                404 fallback)  │
//!   ◀──────────────────────┼───────────────────────────────────────────────│
//!                          │  config · observability · lifecycle          │
//!                          └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use site_edge::config::{load_config, validation::validate_config, ConfigError, EdgeConfig};
use site_edge::lifecycle::{signals, Shutdown};
use site_edge::observability::{logging, metrics};
use site_edge::{HttpServer, HyperUpstream, KvAssetStore};

#[derive(Parser)]
#[command(name = "site-edge", version)]
#[command(about = "Static site edge server with an image mirror", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bypass the edge cache, disable the 404 fallback, expose error detail.
    #[arg(long)]
    debug: bool,

    /// Override listener.bind_address.
    #[arg(long)]
    bind: Option<String>,
}

fn resolve_config(cli: &Cli) -> Result<EdgeConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EdgeConfig::default(),
    };

    if cli.debug {
        config.debug = true;
    }
    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    logging::init(&config.observability);

    tracing::info!("site-edge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        site_root = %config.site.root,
        mirror_prefix = %config.proxy.path_prefix,
        debug = config.debug,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = KvAssetStore::from_dir(&config.site.root)
        .edge_ttl(config.site.edge_ttl())
        .browser_ttl(config.site.browser_ttl_secs.map(std::time::Duration::from_secs))
        .index_document(config.site.index_document.clone());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config, store, HyperUpstream::new());
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
