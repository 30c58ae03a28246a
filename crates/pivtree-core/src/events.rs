//! Observability port
//!
//! The engine is pure; the only thing it does besides computing is emitting
//! [`EngineEvent`]s into whichever [`EventSink`] the host injected through
//! the [`crate::ExecutionContext`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Structured diagnostic emitted by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// An authored JSON field could not be parsed and was replaced by an empty value
    ConfigParseFailed { field: String, error: String },

    /// One entry of an authored list had an unknown shape and was dropped
    RuleShapeIgnored {
        field: String,
        index: usize,
        reason: String,
    },

    /// A rule tried to write a field it may not touch
    RuleFieldIgnored { field: String },

    /// The hierarchy declares a different number of slots than there are metrics
    StructuralMismatch { declared: usize, metrics: usize },

    /// A swap batch was rejected because at least one pair crosses groups
    SwapRejected { violations: Vec<String> },

    /// A single swap pair was out of bounds and skipped
    SwapSkipped {
        index: usize,
        from: i64,
        to: i64,
        len: usize,
    },

    /// A pipeline stage finished
    StageCompleted {
        stage: String,
        rows_in: usize,
        rows_out: usize,
    },
}

impl EngineEvent {
    /// Short machine name of the event
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::ConfigParseFailed { .. } => "config_parse_failed",
            EngineEvent::RuleShapeIgnored { .. } => "rule_shape_ignored",
            EngineEvent::RuleFieldIgnored { .. } => "rule_field_ignored",
            EngineEvent::StructuralMismatch { .. } => "structural_mismatch",
            EngineEvent::SwapRejected { .. } => "swap_rejected",
            EngineEvent::SwapSkipped { .. } => "swap_skipped",
            EngineEvent::StageCompleted { .. } => "stage_completed",
        }
    }

    /// Whether a configuration author should see this event
    pub fn is_warning(&self) -> bool {
        !matches!(self, EngineEvent::StageCompleted { .. })
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::ConfigParseFailed { field, error } => {
                write!(f, "could not parse {}: {}", field, error)
            }
            EngineEvent::RuleShapeIgnored {
                field,
                index,
                reason,
            } => write!(f, "ignored {}[{}]: {}", field, index, reason),
            EngineEvent::RuleFieldIgnored { field } => {
                write!(f, "rules may not set '{}'", field)
            }
            EngineEvent::StructuralMismatch { declared, metrics } => write!(
                f,
                "hierarchy declares {} slots for {} metrics",
                declared, metrics
            ),
            EngineEvent::SwapRejected { violations } => {
                write!(f, "swap batch rejected: {}", violations.join("; "))
            }
            EngineEvent::SwapSkipped {
                index,
                from,
                to,
                len,
            } => write!(
                f,
                "swap #{} ({} <-> {}) is out of bounds for {} slots",
                index, from, to, len
            ),
            EngineEvent::StageCompleted {
                stage,
                rows_in,
                rows_out,
            } => write!(f, "stage {}: {} -> {} rows", stage, rows_in, rows_out),
        }
    }
}

/// Where engine events go
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &EngineEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &EngineEvent) {
        if event.is_warning() {
            tracing::warn!(kind = event.kind(), "{}", event);
        } else {
            tracing::debug!(kind = event.kind(), "{}", event);
        }
    }
}

/// Drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &EngineEvent) {}
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Recorded events a configuration author should see
    pub fn warnings(&self) -> Vec<EngineEvent> {
        self.events().into_iter().filter(EngineEvent::is_warning).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &EngineEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}

/// Sends each event to several sinks
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: &EngineEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.emit(&EngineEvent::RuleFieldIgnored {
            field: "level4".into(),
        });
        sink.emit(&EngineEvent::StageCompleted {
            stage: "relocate".into(),
            rows_in: 2,
            rows_out: 2,
        });
        assert_eq!(sink.events().len(), 2);
        assert_eq!(sink.warnings().len(), 1);
        assert_eq!(sink.events()[0].kind(), "rule_field_ignored");
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let a = Arc::new(RecordingSink::new());
        let b = Arc::new(RecordingSink::new());
        let fanout = FanoutSink::new().with(a.clone()).with(b.clone());
        fanout.emit(&EngineEvent::StructuralMismatch {
            declared: 1,
            metrics: 2,
        });
        assert_eq!(a.events().len(), 1);
        assert_eq!(b.events().len(), 1);
    }

    #[test]
    fn test_event_serializes_tagged() {
        let event = EngineEvent::SwapRejected {
            violations: vec!["cannot move item from group A to group B".into()],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "swap_rejected");
        assert!(event.to_string().contains("group A to group B"));
    }
}
