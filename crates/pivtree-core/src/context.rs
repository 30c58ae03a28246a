//! Execution Context: state shared by every step of one engine run
use crate::events::{EngineEvent, EventSink, TracingSink};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct ExecutionContext {
    pub trace_id: String,
    pub started_at: DateTime<Utc>,
    pub metadata: HashMap<String, Value>,
    sink: Arc<dyn EventSink>,
}

impl ExecutionContext {
    /// Context that reports through `tracing`
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            metadata: HashMap::new(),
            sink,
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    /// Emit a diagnostic under this run's trace id
    pub fn emit(&self, event: EngineEvent) {
        let span = tracing::debug_span!("pivtree", trace_id = %self.trace_id);
        let _guard = span.enter();
        self.sink.emit(&event);
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("trace_id", &self.trace_id)
            .field("started_at", &self.started_at)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
