//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum Router with the edge handler
//! - Wire up middleware (request ID, tracing, panic recovery)
//! - Dispatch each request to the proxy or the site
//! - Bind server to listener and drain on shutdown

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::assets::{AssetRequest, AssetStore};
use crate::config::EdgeConfig;
use crate::http::request::{request_id, request_id_layer};
use crate::http::response::{internal_error, PanicResponder};
use crate::observability::metrics;
use crate::proxy::{Proxy, Upstream};
use crate::routing::{Disposition, Router as EdgeRouter};
use crate::site::Site;

/// Application state injected into handlers.
pub struct AppState<S, U> {
    pub router: Arc<EdgeRouter>,
    pub proxy: Arc<Proxy<U>>,
    pub site: Arc<Site<S>>,
    pub debug: bool,
}

impl<S, U> Clone for AppState<S, U> {
    fn clone(&self) -> Self {
        Self {
            router: self.router.clone(),
            proxy: self.proxy.clone(),
            site: self.site.clone(),
            debug: self.debug,
        }
    }
}

/// HTTP server for the edge.
pub struct HttpServer {
    router: Router,
    config: EdgeConfig,
}

impl HttpServer {
    /// Create a new HTTP server over the given asset store and upstream.
    pub fn new<S: AssetStore, U: Upstream>(config: EdgeConfig, store: S, upstream: U) -> Self {
        let state = AppState {
            router: Arc::new(EdgeRouter::from_config(&config.proxy)),
            proxy: Arc::new(Proxy::new(upstream, &config.proxy)),
            site: Arc::new(Site::new(store, &config)),
            debug: config.debug,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router<S: AssetStore, U: Upstream>(config: &EdgeConfig, state: AppState<S, U>) -> Router {
        Router::new()
            .route("/{*path}", any(edge_handler::<S, U>))
            .route("/", any(edge_handler::<S, U>))
            .with_state(state)
            .layer(CatchPanicLayer::custom(PanicResponder { debug: config.debug }))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %request_id(request.headers()),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }))
            .layer(request_id_layer())
    }

    /// The fully layered router, for serving or in-process calls.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            debug = self.config.debug,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }
}

/// Edge handler: route, then proxy or serve.
async fn edge_handler<S: AssetStore, U: Upstream>(
    State(state): State<AppState<S, U>>,
    request: Request<Body>,
) -> Response<Body> {
    let start = Instant::now();
    // Bodies are never forwarded or read.
    let (parts, _body) = request.into_parts();

    tracing::info!(path = %parts.uri.path(), "Received");

    let disposition = state.router.route(&parts);
    let response = match &disposition {
        Disposition::Proxy { url } => state.proxy.forward(url, parts.method.clone(), &parts.headers).await,
        Disposition::Asset => match AssetRequest::from_parts(&parts) {
            Ok(asset_request) => state.site.serve(&asset_request).await,
            Err(e) => {
                tracing::error!(error = %e, "Unable to build asset request");
                internal_error(state.debug, &e.to_string())
            }
        },
    };

    tracing::debug!(
        disposition = disposition.label(),
        status = %response.status(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Responded"
    );
    metrics::record_request(disposition.label(), response.status().as_u16(), start);
    response
}
