//! NAPI bindings for the pivtree engine
//!
//! Everything crosses the boundary as JSON text so the dashboard can pass
//! its stored form data straight through.

use napi::bindgen_prelude::*;
use pivtree_core::{EngineConfig, ExecutionContext, FanoutSink, RecordingSink, TracingSink};
use pivtree_pipeline::{ReorderRequest, TreeEngine};
use serde::Serialize;
use std::sync::Arc;

/// Result of an engine call
#[napi(object)]
pub struct EngineResult {
    pub trace_id: String,
    pub result_json: String,
    /// Warnings emitted while decoding and running, as a JSON array
    pub diagnostics_json: String,
}

fn parse<T: serde::de::DeserializeOwned>(what: &str, json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| Error::from_reason(format!("invalid {}: {}", what, e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::from_reason(e.to_string()))
}

fn engine(config_json: &str) -> Result<(TreeEngine, Arc<RecordingSink>)> {
    let config: EngineConfig = parse("config", config_json)?;
    let sink = Arc::new(RecordingSink::new());
    let fanout = FanoutSink::new().with(sink.clone()).with(Arc::new(TracingSink));
    let engine = TreeEngine::with_context(config, ExecutionContext::with_sink(Arc::new(fanout)));
    Ok((engine, sink))
}

fn finish<T: Serialize>(engine: &TreeEngine, sink: &RecordingSink, result: &T) -> Result<EngineResult> {
    Ok(EngineResult {
        trace_id: engine.context().trace_id.clone(),
        result_json: to_json(result)?,
        diagnostics_json: to_json(&sink.warnings())?,
    })
}

/// Slot order after configured swaps
#[napi]
pub fn layout(config_json: String) -> Result<EngineResult> {
    let (engine, sink) = engine(&config_json)?;
    let layout = engine.layout();
    finish(&engine, &sink, &layout)
}

/// Expand, relocate, exclude and order a batch of rows
#[napi]
pub fn process(config_json: String, rows_json: String) -> Result<EngineResult> {
    let (engine, sink) = engine(&config_json)?;
    let rows: Vec<pivtree_core::DataRow> = parse("rows", &rows_json)?;
    let output = engine.process(&rows);
    finish(&engine, &sink, &output)
}

/// Plan a drag or a full reorder; cross-group moves are errors
#[napi]
pub fn plan_reorder(config_json: String, request_json: String) -> Result<EngineResult> {
    let (engine, sink) = engine(&config_json)?;
    let request: ReorderRequest = parse("reorder request", &request_json)?;
    let payload = engine
        .plan(&request)
        .map_err(|e| Error::from_reason(e.to_string()))?;
    finish(&engine, &sink, &payload)
}
