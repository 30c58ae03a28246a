//! Pivtree Core: data model, configuration, observability port and stage runner
//!
//! Shared foundation for the hierarchical metric slot engine. Every other
//! crate in the workspace speaks the types defined here.

pub mod config;
pub mod context;
pub mod data_model;
pub mod error;
pub mod events;
pub mod ordered;
pub mod runner;
pub mod stage;

pub use config::{Authored, EngineConfig};
pub use context::ExecutionContext;
pub use data_model::{
    value_label, DataRow, Level, MetricSpec, ProcessedRow, Slot, StageTrace, WorkingTuple,
};
pub use error::PivtreeError;
pub use events::{EngineEvent, EventSink, FanoutSink, NullSink, RecordingSink, TracingSink};
pub use ordered::OrderedSet;
pub use runner::{digest, PipelineRunner};
pub use stage::Stage;

/// Engine version reported by the outer surfaces
pub const PIVTREE_VERSION: &str = "1.0.0";
