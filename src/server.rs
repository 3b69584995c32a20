//! HTTP Server
//!
//! This module implements the Prometheus exporter HTTP server. Every request to
//! `/metrics` triggers one scrape cycle against the device before the registry
//! is rendered, so the exported values are as fresh as the scrape itself.
//!
//! # Endpoints
//!
//! - `GET /` - Permanent redirect to `/metrics`
//! - `GET /metrics` - Scrape the device, then return Prometheus metrics in text format
//! - `GET /health` - Health check (200 if the last scrape reached the device, 503 otherwise)
//!
//! # Error Handling
//!
//! Device failures never turn into a failed scrape response: `/metrics` always
//! answers 200 with the best available snapshot. Failures are visible through
//! `fronius_scrape_error_count`, `fronius_up` and the logs.

use crate::config::Config;
use crate::error::ExporterError;
use crate::metrics::MetricsCollector;
use crate::scraper::Scraper;
use crate::symo::SymoClient;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub metrics: MetricsCollector,
    pub scraper: Arc<Scraper>,
}

impl AppState {
    pub fn new(scraper: Scraper) -> Self {
        Self {
            metrics: scraper.metrics().clone(),
            scraper: Arc::new(scraper),
        }
    }
}

/// Build the exporter's state from a validated configuration
pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let metrics = MetricsCollector::with_site(&config.symo.site_name())?;
    let client = SymoClient::new(config.symo.client_options())?;
    let scraper = Scraper::new(client, metrics, config.symo.offsets());
    Ok(AppState::new(scraper))
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let state = build_state(&config)?;
    info!("Polling sub-endpoints: {:?}", state.scraper.enabled_kinds());

    // Start the server
    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ExporterError::Server(format!("failed to bind {}: {}", addr, e)))?;

    info!("Listening for scrapes on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    serve(listener, state).await
}

/// Serve the exporter on an already bound listener
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, app(state))
        .await
        .map_err(ExporterError::Io)?;
    Ok(())
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn root_handler() -> Redirect {
    Redirect::permanent("/metrics")
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    state.scraper.collect_once().await;

    match state.metrics.render() {
        Ok(metrics) => metrics.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let up_value = state.metrics.up.get();

    if up_value > 0.0 {
        (axum::http::StatusCode::OK, "OK")
    } else {
        (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Fronius device unreachable",
        )
    }
}
