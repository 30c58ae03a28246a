//! Relocation Rule Engine
//!
//! From/to rules run first and stop at the first match. When/set rules then
//! run in order against the current state, so a later rule sees what an
//! earlier one wrote.

use crate::fields::field_value;
use crate::rule::{FromToRule, RuleSet, WhenSetRule};
use pivtree_core::{value_label, DataRow, WorkingTuple};
use serde::Serialize;

/// Which rules fired for one row × metric
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelocationOutcome {
    /// Position of the from/to rule that matched
    pub from_to: Option<usize>,
    pub when_set: Vec<usize>,
}

impl RelocationOutcome {
    pub fn is_relocated(&self) -> bool {
        self.from_to.is_some() || !self.when_set.is_empty()
    }
}

/// Apply `rules` to the working tuple and the row's dimension copy
pub fn relocate(
    tuple: &mut WorkingTuple,
    dimensions: &mut DataRow,
    metric_label: &str,
    rules: &RuleSet,
) -> RelocationOutcome {
    let mut outcome = RelocationOutcome::default();

    if let Some((position, rule)) = rules
        .from_to
        .iter()
        .enumerate()
        .find(|(_, rule)| from_matches(rule, tuple, dimensions, metric_label, &rules.platform_column))
    {
        for (level, value) in &rule.to {
            tuple.set_level(level.as_str(), value.as_str());
        }
        outcome.from_to = Some(position);
    }

    for (position, rule) in rules.when_set.iter().enumerate() {
        if when_holds(rule, tuple, dimensions) {
            apply_set(rule, tuple, dimensions);
            outcome.when_set.push(position);
        }
    }

    outcome
}

fn from_matches(
    rule: &FromToRule,
    tuple: &WorkingTuple,
    dimensions: &DataRow,
    metric_label: &str,
    platform_column: &str,
) -> bool {
    let platform = dimensions.get(platform_column).map(value_label);

    rule.level1.matches(Some(tuple.level1.as_str()))
        && rule.level2.matches(Some(tuple.level2.as_str()))
        && rule.level3.matches(Some(tuple.level3.as_str()))
        && rule.metric.matches(Some(metric_label))
        && rule.platform.matches(platform.as_deref())
        && rule
            .conditions
            .iter()
            .all(|(field, pattern)| pattern.matches(field_value(field, tuple, dimensions).as_deref()))
}

fn when_holds(rule: &WhenSetRule, tuple: &WorkingTuple, dimensions: &DataRow) -> bool {
    rule.when.iter().all(|(field, expected)| {
        let actual = field_value(field, tuple, dimensions).unwrap_or_default();
        expected.matches(&actual)
    })
}

fn apply_set(rule: &WhenSetRule, tuple: &mut WorkingTuple, dimensions: &mut DataRow) {
    for (field, value) in &rule.set {
        if !tuple.set_level(field, value_label(value)) {
            dimensions.insert(field.clone(), value.clone());
        }
    }
}
