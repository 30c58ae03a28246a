//! Middleware: permissive CORS for the dashboard host and per-route counting
use crate::AppState;
use axum::extract::{MatchedPath, State};
use axum::middleware::Next;
use axum::{body::Body, http::Request, response::Response};
use tower_http::cors::CorsLayer;

pub fn cors() -> CorsLayer {
    CorsLayer::permissive()
}

pub async fn count_requests(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    state.metrics.requests_total.with_label_values(&[route.as_str()]).inc();
    next.run(req).await
}
