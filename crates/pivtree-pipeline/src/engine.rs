//! TreeEngine: one configuration, parsed once, run against any rows

use crate::default_stages;
use crate::expand::expand_rows;
use crate::order::{resolve_orders, SortKeys};
use pivtree_core::{
    digest, DataRow, EngineConfig, EngineEvent, ExecutionContext, PipelineRunner, ProcessedRow, Slot,
    StageTrace,
};
use pivtree_hierarchy::{
    apply_swaps, extend_swaps, index_groups_with, parse_detailed, swaps_from_authored, swaps_to_json,
    CanonicalOrder, GroupIndex, HierarchyDescription, HierarchyParse, ReorderError, ReorderPlan, Swap,
    SwapViolation,
};
use pivtree_rules::{ExclusionSet, RuleSet};
use serde::{Deserialize, Serialize};

/// Slot order after swaps, with the structure it was validated against
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    /// Slots as parsed, before swaps
    pub base_slots: Vec<Slot>,
    pub slots: Vec<Slot>,
    /// Groups of the parsed slots
    pub groups: GroupIndex,
    pub canonical: CanonicalOrder,
    /// Non-empty when the configured swap batch was rejected
    pub violations: Vec<SwapViolation>,
    /// Slots the hierarchy asked for
    pub declared: usize,
}

impl Layout {
    pub fn is_rejected(&self) -> bool {
        !self.violations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedOutput {
    pub slots: Vec<Slot>,
    pub rows: Vec<ProcessedRow>,
    pub orders: SortKeys,
    pub violations: Vec<SwapViolation>,
    /// blake3 digest of slots, rows and orders
    pub fingerprint: String,
    pub pipeline_id: String,
    #[serde(skip)]
    pub traces: Vec<StageTrace>,
}

/// A drag-and-drop request from the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReorderRequest {
    /// Move the column at visual position `from` to `to`
    Move { from: usize, to: usize },
    /// Show columns in exactly this metric order
    Order { order: Vec<String> },
}

/// What the host persists after a reorder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReorderPayload {
    /// Swaps that turn the current order into the requested one
    pub delta: Vec<Swap>,
    /// Full swap list to store in configuration
    pub swaps: Vec<Swap>,
    /// `swaps` as the JSON text stored in the swaps field
    pub swaps_json: String,
    pub slots: Vec<Slot>,
}

pub struct TreeEngine {
    config: EngineConfig,
    ctx: ExecutionContext,
    parsed: HierarchyParse,
    swaps: Vec<Swap>,
    runner: PipelineRunner,
}

impl TreeEngine {
    /// Engine reporting through `tracing`
    pub fn new(config: EngineConfig) -> Self {
        Self::with_context(config, ExecutionContext::new())
    }

    /// Decode every authored field once; malformed ones are reported on `ctx`
    pub fn with_context(config: EngineConfig, ctx: ExecutionContext) -> Self {
        let metrics = config.metric_labels();
        let description = HierarchyDescription::from_authored(&config.hierarchy, &ctx);
        let parsed = parse_detailed(&description, &metrics, config.show_segments);

        if !description.is_empty() && parsed.declared != metrics.len() {
            ctx.emit(EngineEvent::StructuralMismatch {
                declared: parsed.declared,
                metrics: metrics.len(),
            });
        }

        let swaps = swaps_from_authored(&config.swaps, &ctx);
        let rules = RuleSet::from_authored(&config.platform_rules, &config.relocation_rules, &ctx)
            .with_platform_column(config.platform_column.clone());
        let exclusions = ExclusionSet::from_authored(&config.exclusions, &ctx);
        let runner = PipelineRunner::new(default_stages(rules, exclusions));

        Self {
            config,
            ctx,
            parsed,
            swaps,
            runner,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// Configured swaps as decoded
    pub fn swaps(&self) -> &[Swap] {
        &self.swaps
    }

    pub fn pipeline_id(&self) -> &str {
        self.runner.pipeline_id()
    }

    /// Parse result, groups and the slot order after swaps
    pub fn layout(&self) -> Layout {
        let base = &self.parsed.slots;
        let groups = index_groups_with(base, self.config.show_segments, &self.config.group_separator);
        let outcome = apply_swaps(base, &self.swaps, self.config.validate_swaps.then_some(&groups));
        outcome.report(&self.swaps, &self.ctx);

        Layout {
            base_slots: base.clone(),
            canonical: self.parsed.canonical.clone().with_slot_metrics(&outcome.slots),
            slots: outcome.slots,
            groups,
            violations: outcome.violations,
            declared: self.parsed.declared,
        }
    }

    /// Expand, relocate, exclude and order `rows`
    pub fn process(&self, rows: &[DataRow]) -> ProcessedOutput {
        let span = tracing::debug_span!("process", trace_id = %self.ctx.trace_id, rows = rows.len());
        let _guard = span.enter();

        let layout = self.layout();
        let expanded = expand_rows(rows, &layout.slots);
        let (processed, traces) = self.runner.run(expanded, &self.ctx);
        let orders = resolve_orders(&processed, &layout.canonical, self.config.show_segments);
        let fingerprint = digest(&(&layout.slots, &processed, &orders));

        ProcessedOutput {
            slots: layout.slots,
            rows: processed,
            orders,
            violations: layout.violations,
            fingerprint,
            pipeline_id: self.runner.pipeline_id().to_string(),
            traces,
        }
    }

    /// Plan a drag from visual position `from` to `to`
    pub fn plan_move(&self, from: usize, to: usize) -> Result<ReorderPayload, ReorderError> {
        let layout = self.layout();
        let plan = pivtree_hierarchy::plan_move(&layout.slots, self.groups_for(&layout), from, to)?;
        Ok(self.payload(&layout, plan))
    }

    /// Plan the swaps that show metrics in `order`
    pub fn plan_reorder(&self, order: &[String]) -> Result<ReorderPayload, ReorderError> {
        let layout = self.layout();
        let plan = pivtree_hierarchy::plan_reorder(&layout.slots, self.groups_for(&layout), order)?;
        Ok(self.payload(&layout, plan))
    }

    pub fn plan(&self, request: &ReorderRequest) -> Result<ReorderPayload, ReorderError> {
        match request {
            ReorderRequest::Move { from, to } => self.plan_move(*from, *to),
            ReorderRequest::Order { order } => self.plan_reorder(order),
        }
    }

    fn groups_for<'a>(&self, layout: &'a Layout) -> Option<&'a GroupIndex> {
        self.config.validate_swaps.then_some(&layout.groups)
    }

    /// A rejected batch never took effect, so only the delta is kept
    fn payload(&self, layout: &Layout, plan: ReorderPlan) -> ReorderPayload {
        let existing: &[Swap] = if layout.is_rejected() { &[] } else { &self.swaps };
        let swaps = extend_swaps(existing, &plan.delta);
        ReorderPayload {
            swaps_json: swaps_to_json(&swaps),
            swaps,
            delta: plan.delta,
            slots: plan.slots,
        }
    }
}
