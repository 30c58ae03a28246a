//! Pivtree API /v1: REST endpoints over the slot engine
pub mod handlers;
pub mod metrics;
pub mod middleware;

use axum::{
    routing::{get, post},
    Router,
};
use metrics::ApiMetrics;
use std::io;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<ApiMetrics>,
}

impl AppState {
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            metrics: Arc::new(ApiMetrics::new()?),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/layout", post(handlers::layout))
        .route("/v1/process", post(handlers::process))
        .route("/v1/reorder", post(handlers::reorder))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::count_requests,
        ))
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(addr: &str) -> io::Result<()> {
    let state = AppState::new().map_err(io::Error::other)?;
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Pivtree API listening on {}", addr);
    axum::serve(listener, app).await
}
