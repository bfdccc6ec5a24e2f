//! HTTP server
//!
//! Serves the JSON match API next to the health and Prometheus endpoints
//! using Axum. Every route passes through a global concurrency limit and a
//! request counter.

pub mod api;
pub mod health;

pub use api::ApiError;

use crate::service::app::AppState;
use anyhow::{Context, Result};
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tracing::{debug, info, warn};

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Build the router with every endpoint
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_concurrent = state.config().service.max_concurrent_requests;

    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/ready", get(health::ready_handler))
        .route("/alive", get(health::alive_handler))
        .route("/metrics", get(health::metrics_handler))
        .route("/stats", get(health::stats_handler))
        .route(
            "/api/match",
            get(api::remaining_matches_handler).post(api::record_match_handler),
        )
        .route("/api/rank", get(api::standings_handler))
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent))
        .with_state(state)
}

/// Count every answered request by route and status
async fn track_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().clone();

    let response = next.run(request).await;

    let status = response.status();
    debug!("{} {} -> {}", method, route, status.as_u16());
    state
        .metrics_collector()
        .record_http_request(&route, status.as_u16());
    response
}

/// HTTP server for the API and monitoring endpoints
pub struct HttpServer {
    config: HttpServerConfig,
    state: Arc<AppState>,
    shutdown_tx: broadcast::Sender<()>,
}

impl HttpServer {
    /// Create a new server
    pub fn new(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            state,
            shutdown_tx,
        }
    }

    /// Bind and serve until [`stop`](Self::stop) is called
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid HTTP server address")?;

        let app = create_router(self.state.clone());
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        info!("HTTP server listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP server shutdown signal received");
            })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Stop the server
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping HTTP server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to HTTP server: {}", e);
        }

        Ok(())
    }
}
