//! Row expansion: one processed row per source row × slot

use pivtree_core::{DataRow, ProcessedRow, Slot};
use serde_json::Value;
use std::collections::HashSet;

/// Numeric value of a metric cell; numeric text is parsed, anything else is `None`
pub fn metric_value(cell: Option<&Value>) -> Option<f64> {
    match cell? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Expand rows into row × slot combinations, rows outermost
///
/// Metric columns are dropped from the dimensions; an orphan slot keeps its
/// label as `metric_key` but has an empty metric identity.
pub fn expand_rows(rows: &[DataRow], slots: &[Slot]) -> Vec<ProcessedRow> {
    let metric_columns: HashSet<&str> = slots.iter().map(|s| s.metric.as_str()).collect();
    let mut expanded = Vec::with_capacity(rows.len() * slots.len());

    for row in rows {
        let dimensions: DataRow = row
            .iter()
            .filter(|(column, _)| !metric_columns.contains(column.as_str()))
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect();

        for slot in slots {
            expanded.push(ProcessedRow {
                dimensions: dimensions.clone(),
                level1: slot.level1.clone(),
                level2: slot.level2.clone(),
                level3: slot.level3.clone(),
                level4: slot.level4.clone(),
                metric: if slot.orphan { String::new() } else { slot.metric.clone() },
                metric_key: slot.metric.clone(),
                value: metric_value(row.get(&slot.metric)),
            });
        }
    }

    expanded
}
