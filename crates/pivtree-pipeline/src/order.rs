//! Order Resolver
//!
//! Every column the renderer pivots on gets an explicit value order:
//! - `level1`, `level2`, `level4`, `metric`: first appearance in the processed rows
//! - `level3` with segments shown: authored order, then unseen values
//! - dimension columns: first appearance, per column
//!
//! Values outside an order sort after it, lexically.

use pivtree_core::{value_label, Level, OrderedSet, ProcessedRow};
use pivtree_hierarchy::CanonicalOrder;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Column under which the metric axis is ordered
pub const METRIC_COLUMN: &str = "metric";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ColumnOrder {
    pub column: String,
    pub values: OrderedSet,
}

/// Value order per column, in column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortKeys {
    columns: Vec<ColumnOrder>,
    index: HashMap<String, usize>,
}

impl SortKeys {
    pub fn new() -> Self {
        Self::default()
    }

    fn column_mut(&mut self, column: &str) -> &mut OrderedSet {
        let position = match self.index.get(column) {
            Some(&position) => position,
            None => {
                self.index.insert(column.to_string(), self.columns.len());
                self.columns.push(ColumnOrder {
                    column: column.to_string(),
                    values: OrderedSet::new(),
                });
                self.columns.len() - 1
            }
        };
        &mut self.columns[position].values
    }

    fn observe(&mut self, column: &str, value: &str) {
        let values = self.column_mut(column);
        if !value.is_empty() {
            values.insert(value);
        }
    }

    pub fn get(&self, column: &str) -> Option<&OrderedSet> {
        self.index.get(column).map(|&position| &self.columns[position].values)
    }

    /// Ordered values of a column
    pub fn order(&self, column: &str) -> Option<&[String]> {
        self.get(column).map(OrderedSet::as_slice)
    }

    pub fn rank(&self, column: &str, value: &str) -> Option<usize> {
        self.get(column).and_then(|values| values.position(value))
    }

    /// Sort function for one column
    pub fn comparator<'a>(&'a self, column: &str) -> impl Fn(&str, &str) -> Ordering + 'a {
        let values = self.get(column);
        move |a: &str, b: &str| {
            let rank = |v: &str| values.and_then(|set| set.position(v));
            match (rank(a), rank(b)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.cmp(b),
            }
        }
    }

    /// Sort values of `column` in place
    pub fn sort(&self, column: &str, values: &mut [String]) {
        let compare = self.comparator(column);
        values.sort_by(|a, b| compare(a.as_str(), b.as_str()));
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.column.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for SortKeys {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.columns.len()))?;
        for column in &self.columns {
            seq.serialize_element(column)?;
        }
        seq.end()
    }
}

fn is_reserved(column: &str) -> bool {
    column == METRIC_COLUMN || Level::parse(column).is_some()
}

/// Compute the sort keys for a set of processed rows
pub fn resolve_orders(rows: &[ProcessedRow], canonical: &CanonicalOrder, show_segments: bool) -> SortKeys {
    let mut keys = SortKeys::new();

    for level in Level::ALL {
        keys.column_mut(level.as_str());
    }
    keys.column_mut(METRIC_COLUMN);

    if show_segments {
        let level3 = keys.column_mut(Level::Level3.as_str());
        level3.extend(canonical.level3.iter());
    }

    for row in rows {
        for level in Level::ALL {
            keys.observe(level.as_str(), row.level(level));
        }
        keys.observe(METRIC_COLUMN, &row.metric);

        for (column, value) in &row.dimensions {
            if !is_reserved(column) {
                keys.observe(column, &value_label(value));
            }
        }
    }

    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivtree_core::DataRow;
    use serde_json::json;

    fn row(levels: [&str; 4], metric: &str, dims: serde_json::Value) -> ProcessedRow {
        ProcessedRow {
            dimensions: dims.as_object().cloned().unwrap_or_else(DataRow::new),
            level1: levels[0].to_string(),
            level2: levels[1].to_string(),
            level3: levels[2].to_string(),
            level4: levels[3].to_string(),
            metric: metric.to_string(),
            metric_key: metric.to_string(),
            value: None,
        }
    }

    fn canonical(level3: &[&str]) -> CanonicalOrder {
        CanonicalOrder {
            level3: level3.iter().copied().collect(),
            ..CanonicalOrder::default()
        }
    }

    fn rows() -> Vec<ProcessedRow> {
        vec![
            row(["B", "x", "Late", ""], "m2", json!({"region": "South", "year": 2024})),
            row(["A", "y", "Extra", ""], "m1", json!({"region": "North", "year": 2023})),
            row(["B", "x", "Early", ""], "m2", json!({"region": "South", "year": 2024})),
        ]
    }

    #[test]
    fn test_first_appearance_orders() {
        let keys = resolve_orders(&rows(), &canonical(&[]), false);
        assert_eq!(keys.order("level1"), Some(&["B".to_string(), "A".to_string()][..]));
        assert_eq!(keys.order("metric").map(|o| o.len()), Some(2));
        assert_eq!(keys.rank("metric", "m2"), Some(0));
        assert_eq!(keys.rank("year", "2023"), Some(1));
        assert_eq!(keys.rank("level3", "Late"), Some(0));
    }

    #[test]
    fn test_level3_follows_canonical_when_segments_shown() {
        let keys = resolve_orders(&rows(), &canonical(&["Early", "Late", "Unused"]), true);
        let level3: Vec<&str> = keys.get("level3").map(|o| o.iter().collect()).unwrap_or_default();
        assert_eq!(level3, vec!["Early", "Late", "Unused", "Extra"]);
    }

    #[test]
    fn test_columns_are_stable() {
        let keys = resolve_orders(&rows(), &canonical(&[]), true);
        let columns: Vec<&str> = keys.columns().collect();
        assert_eq!(columns, vec!["level1", "level2", "level3", "level4", "metric", "region", "year"]);
    }

    #[test]
    fn test_comparator_puts_unknown_last() {
        let keys = resolve_orders(&rows(), &canonical(&[]), false);
        let mut values = vec!["zeta".to_string(), "A".to_string(), "alpha".to_string(), "B".to_string()];
        keys.sort("level1", &mut values);
        assert_eq!(values, vec!["B", "A", "alpha", "zeta"]);

        let compare = keys.comparator("no-such-column");
        assert_eq!(compare("a", "b"), Ordering::Less);
    }

    #[test]
    fn test_serializes_as_ordered_entries() {
        let keys = resolve_orders(&rows()[..1], &canonical(&[]), false);
        let value = serde_json::to_value(&keys).unwrap();
        assert_eq!(value[0], json!({"column": "level1", "values": ["B"]}));
        assert_eq!(value[5], json!({"column": "region", "values": ["South"]}));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let canonical = canonical(&["Late"]);
        assert_eq!(resolve_orders(&rows(), &canonical, true), resolve_orders(&rows(), &canonical, true));
    }
}
