use pivtree_core::{ExecutionContext, ProcessedRow, Stage};
use pivtree_rules::{relocate, ExclusionSet, RuleSet};

/// Retargets each row's levels with the compiled relocation rules
#[derive(Debug, Clone, Default)]
pub struct RelocateStage {
    rules: RuleSet,
}

impl RelocateStage {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

impl Stage for RelocateStage {
    fn id(&self) -> &'static str {
        "relocate.rules.v1"
    }

    fn run(&self, mut rows: Vec<ProcessedRow>, _ctx: &ExecutionContext) -> Vec<ProcessedRow> {
        if self.rules.is_empty() {
            return rows;
        }
        for row in &mut rows {
            let mut tuple = row.tuple();
            relocate(&mut tuple, &mut row.dimensions, &row.metric_key, &self.rules);
            row.apply_tuple(tuple);
        }
        rows
    }
}

/// Drops row × metric combinations matched by an exclusion rule
#[derive(Debug, Clone, Default)]
pub struct ExcludeStage {
    exclusions: ExclusionSet,
}

impl ExcludeStage {
    pub fn new(exclusions: ExclusionSet) -> Self {
        Self { exclusions }
    }
}

impl Stage for ExcludeStage {
    fn id(&self) -> &'static str {
        "exclude.filter.v1"
    }

    fn run(&self, rows: Vec<ProcessedRow>, _ctx: &ExecutionContext) -> Vec<ProcessedRow> {
        if self.exclusions.is_empty() {
            return rows;
        }
        rows.into_iter()
            .filter(|row| !self.exclusions.is_excluded(&row.tuple(), &row.dimensions))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivtree_core::{Authored, DataRow, PipelineRunner};
    use serde_json::json;

    fn row(level1: &str, region: &str) -> ProcessedRow {
        let mut dimensions = DataRow::new();
        dimensions.insert("region".to_string(), json!(region));
        ProcessedRow {
            dimensions,
            level1: level1.to_string(),
            level2: "Paid".to_string(),
            level3: String::new(),
            level4: "Brand".to_string(),
            metric: "spend".to_string(),
            metric_key: "spend".to_string(),
            value: Some(1.0),
        }
    }

    #[test]
    fn test_relocate_stage_writes_back_levels_only() {
        let ctx = ExecutionContext::default();
        let rules = RuleSet::from_authored(
            &Authored::default(),
            &Authored::from(json!([{"from": {"metric": "spend"}, "to": {"level1": "Moved", "level4": "X"}}])),
            &ctx,
        );
        let out = RelocateStage::new(rules).run(vec![row("Media", "North")], &ctx);
        assert_eq!(out[0].level1, "Moved");
        assert_eq!(out[0].level4, "Brand");
        assert_eq!(out[0].metric, "spend");
    }

    #[test]
    fn test_exclude_stage_filters() {
        let ctx = ExecutionContext::default();
        let exclusions = ExclusionSet::from_authored(&Authored::from(r#"["south"]"#), &ctx);
        let out = ExcludeStage::new(exclusions).run(vec![row("A", "North"), row("B", "South")], &ctx);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].level1, "A");
    }

    #[test]
    fn test_default_stage_order() {
        let runner = PipelineRunner::new(crate::default_stages(RuleSet::new(), ExclusionSet::new()));
        assert_eq!(runner.pipeline_id(), "relocate→exclude");
    }
}
