//! Pivtree Pipeline: from raw query rows to rows ready for pivoting
//!
//! # Pipeline Flow
//!
//! ```text
//! config → parse → swaps ─┐
//!                          ↓
//! rows → expand (row × slot) → relocate → exclude → resolve_orders
//!                               ↓           ↓            ↓
//!                           retargeted   filtered    sort keys
//! ```
//!
//! [`TreeEngine`] wires everything together from one [`pivtree_core::EngineConfig`].

mod engine;
mod expand;
mod order;
mod stages;

pub use engine::{Layout, ProcessedOutput, ReorderPayload, ReorderRequest, TreeEngine};
pub use expand::{expand_rows, metric_value};
pub use order::{resolve_orders, ColumnOrder, SortKeys, METRIC_COLUMN};
pub use stages::{ExcludeStage, RelocateStage};

use pivtree_core::Stage;
use pivtree_rules::{ExclusionSet, RuleSet};

/// Stages in the order the engine runs them: `relocate → exclude`
pub fn default_stages(rules: RuleSet, exclusions: ExclusionSet) -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(RelocateStage::new(rules)),
        Box::new(ExcludeStage::new(exclusions)),
    ]
}
