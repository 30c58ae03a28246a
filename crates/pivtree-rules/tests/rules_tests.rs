//! Integration tests for relocation and exclusion as a host configures them:
//! rule lists typed as JSON text, applied per row × metric.

use pivtree_core::{Authored, DataRow, ExecutionContext, RecordingSink, Slot, WorkingTuple};
use pivtree_rules::{relocate, ExclusionSet, RuleSet};
use serde_json::{json, Value};
use std::sync::Arc;

fn row(value: Value) -> DataRow {
    value.as_object().cloned().unwrap_or_default()
}

/// Relocate then filter, the way the pipeline does for one combination
fn resolve(slot: &Slot, dims: &DataRow, rules: &RuleSet, exclusions: &ExclusionSet) -> Option<WorkingTuple> {
    let mut tuple = WorkingTuple::from_slot(slot);
    let mut dims = dims.clone();
    relocate(&mut tuple, &mut dims, &slot.metric, rules);
    (!exclusions.is_excluded(&tuple, &dims)).then_some(tuple)
}

// =============================================================================
// Flat exclusion
// =============================================================================

#[test]
fn test_flat_exclusion_drops_row_for_every_metric() {
    let ctx = ExecutionContext::default();
    let exclusions = ExclusionSet::from_authored(&Authored::from(r#"["Competitor"]"#), &ctx);
    let rules = RuleSet::new();
    let dims = row(json!({"region": "Competitor", "month": "Jan"}));

    for metric in ["spend", "clicks", "orders"] {
        let slot = Slot::placed(["Media", "Paid", "", ""], metric);
        assert!(resolve(&slot, &dims, &rules, &exclusions).is_none());
    }
    let kept = row(json!({"region": "North", "month": "Jan"}));
    assert!(resolve(&Slot::orphan("spend"), &kept, &rules, &exclusions).is_some());
}

// =============================================================================
// Rule interplay
// =============================================================================

#[test]
fn test_platform_rules_run_before_relocation_rules() {
    let ctx = ExecutionContext::default();
    let rules = RuleSet::from_authored(
        &Authored::from(r#"[{"from": {"platform": "TikTok"}, "to": {"level2": "Social"}}]"#),
        &Authored::from(r#"[{"from": {"level1": "Media"}, "to": {"level2": "Catch-all"}}]"#),
        &ctx,
    );
    let slot = Slot::placed(["Media", "Paid", "Video", ""], "views");

    let tiktok = resolve(&slot, &row(json!({"platform": "tiktok"})), &rules, &ExclusionSet::new());
    assert_eq!(tiktok.map(|t| t.level2), Some("Social".to_string()));

    let other = resolve(&slot, &row(json!({"platform": "YouTube"})), &rules, &ExclusionSet::new());
    assert_eq!(other.map(|t| t.level2), Some("Catch-all".to_string()));
}

#[test]
fn test_exclusion_sees_relocated_levels() {
    let ctx = ExecutionContext::default();
    let rules = RuleSet::from_authored(
        &Authored::default(),
        &Authored::from(json!([{"when": {"campaign": "Test"}, "set": {"level2": "Sandbox"}}])),
        &ctx,
    );
    let exclusions = ExclusionSet::from_authored(&Authored::from(json!([{"key": "level2", "values": ["sandbox"]}])), &ctx);
    let slot = Slot::placed(["Media", "Paid", "", ""], "spend");

    assert!(resolve(&slot, &row(json!({"campaign": "test"})), &rules, &exclusions).is_none());
    assert!(resolve(&slot, &row(json!({"campaign": "Launch"})), &rules, &exclusions).is_some());
}

#[test]
fn test_from_to_keeps_subsegment_and_metric_for_any_rule() {
    let ctx = ExecutionContext::default();
    let rules = RuleSet::from_authored(
        &Authored::default(),
        &Authored::from(json!([
            {"from": {}, "to": {"level1": "X", "level2": "Y", "level3": "Z", "level4": "W", "metric": "V"}}
        ])),
        &ctx,
    );
    for slot in [Slot::placed(["A", "B", "C", "D"], "m"), Slot::orphan("n")] {
        let tuple = resolve(&slot, &DataRow::new(), &rules, &ExclusionSet::new()).unwrap();
        assert_eq!(tuple.level4, slot.level4);
        assert_eq!(tuple.metric, slot.metric);
        assert_eq!(tuple.level1, "X");
    }
}

#[test]
fn test_malformed_rule_text_is_reported_not_raised() {
    let sink = Arc::new(RecordingSink::new());
    let ctx = ExecutionContext::with_sink(sink.clone());
    let rules = RuleSet::from_authored(&Authored::from("[{\"from\""), &Authored::from("nope"), &ctx);
    let exclusions = ExclusionSet::from_authored(&Authored::from("{"), &ctx);

    assert!(rules.is_empty());
    assert!(exclusions.is_empty());
    assert_eq!(sink.warnings().len(), 3);
}
