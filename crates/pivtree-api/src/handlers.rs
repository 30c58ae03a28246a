//! HTTP handlers
//!
//! Every request carries the full configuration; the engine is built per
//! request and its warnings are returned next to the result.

use crate::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use pivtree_core::{
    DataRow, EngineConfig, EngineEvent, ExecutionContext, FanoutSink, RecordingSink, TracingSink,
    PIVTREE_VERSION,
};
use pivtree_hierarchy::ReorderError;
use pivtree_pipeline::{ReorderRequest, TreeEngine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LayoutRequest {
    pub config: EngineConfig,
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub config: EngineConfig,
    #[serde(default)]
    pub rows: Vec<DataRow>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderBody {
    pub config: EngineConfig,
    pub request: ReorderRequest,
}

/// Result body with the run's trace id and warnings
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub trace_id: String,
    pub result: T,
    pub diagnostics: Vec<EngineEvent>,
}

struct Run {
    engine: TreeEngine,
    sink: Arc<RecordingSink>,
}

impl Run {
    fn new(config: EngineConfig) -> Self {
        let sink = Arc::new(RecordingSink::new());
        let fanout = FanoutSink::new()
            .with(sink.clone())
            .with(Arc::new(TracingSink));
        let engine = TreeEngine::with_context(config, ExecutionContext::with_sink(Arc::new(fanout)));
        Self { engine, sink }
    }

    fn finish<T>(self, result: T) -> Envelope<T> {
        Envelope {
            trace_id: self.engine.context().trace_id.clone(),
            result,
            diagnostics: self.sink.warnings(),
        }
    }
}

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": PIVTREE_VERSION
    }))
}

pub async fn layout(State(state): State<AppState>, Json(body): Json<LayoutRequest>) -> impl IntoResponse {
    let run = Run::new(body.config);
    let layout = run.engine.layout();
    if layout.is_rejected() {
        state.metrics.swap_batches_rejected_total.inc();
    }
    Json(run.finish(layout))
}

pub async fn process(State(state): State<AppState>, Json(body): Json<ProcessRequest>) -> impl IntoResponse {
    let run = Run::new(body.config);
    let output = run.engine.process(&body.rows);
    if !output.violations.is_empty() {
        state.metrics.swap_batches_rejected_total.inc();
    }
    state.metrics.rows_processed_total.inc_by(output.rows.len() as u64);
    tracing::info!(
        pipeline = %output.pipeline_id,
        rows_in = body.rows.len(),
        rows_out = output.rows.len(),
        "processed"
    );
    Json(run.finish(output))
}

pub async fn reorder(Json(body): Json<ReorderBody>) -> (StatusCode, Json<Value>) {
    let run = Run::new(body.config);
    match run.engine.plan(&body.request) {
        Ok(payload) => {
            let envelope = run.finish(payload);
            match serde_json::to_value(&envelope) {
                Ok(value) => (StatusCode::OK, Json(value)),
                Err(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": e.to_string()})),
                ),
            }
        }
        Err(e) => {
            let violations: Vec<String> = match &e {
                ReorderError::CrossGroup(violations) => violations.iter().map(|v| v.to_string()).collect(),
                _ => Vec::new(),
            };
            tracing::warn!(trace_id = %run.engine.context().trace_id, error = %e, "reorder refused");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": e.to_string(),
                    "violations": violations,
                    "diagnostics": run.sink.warnings()
                })),
            )
        }
    }
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            e.to_string(),
        ),
    }
}
