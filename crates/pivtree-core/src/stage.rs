//! Stage Trait: single contract for every row-processing stage
use crate::context::ExecutionContext;
use crate::data_model::ProcessedRow;

/// One step of the row pipeline (relocation, exclusion, ...)
///
/// Stages never fail: anything they cannot make sense of is passed through
/// unchanged and reported through the context.
pub trait Stage: Send + Sync {
    /// Unique stage id (ex: "relocate.rules.v1")
    fn id(&self) -> &'static str;

    /// Whether identical input always yields identical output (default: true)
    fn deterministic(&self) -> bool {
        true
    }

    fn run(&self, rows: Vec<ProcessedRow>, ctx: &ExecutionContext) -> Vec<ProcessedRow>;
}
