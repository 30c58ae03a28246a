//! Data Model: Slot, WorkingTuple, ProcessedRow, MetricSpec
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One raw query result row: column name → scalar value, in column order.
pub type DataRow = Map<String, Value>;

/// Depth in the header hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Level1,
    Level2,
    Level3,
    Level4,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Level1, Level::Level2, Level::Level3, Level::Level4];

    /// Column name used for this level in processed rows and sort keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Level1 => "level1",
            Level::Level2 => "level2",
            Level::Level3 => "level3",
            Level::Level4 => "level4",
        }
    }

    pub fn parse(name: &str) -> Option<Level> {
        match name {
            "level1" => Some(Level::Level1),
            "level2" => Some(Level::Level2),
            "level3" => Some(Level::Level3),
            "level4" => Some(Level::Level4),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The hierarchy position assigned to one metric.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub level1: String,
    pub level2: String,
    pub level3: String,
    pub level4: String,
    /// Stable metric identifier (its label)
    pub metric: String,
    /// Set when the hierarchy description did not place this metric
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub orphan: bool,
}

impl Slot {
    /// Create a placed slot from a four-level path
    pub fn placed(path: [&str; 4], metric: impl Into<String>) -> Self {
        Self {
            level1: path[0].to_string(),
            level2: path[1].to_string(),
            level3: path[2].to_string(),
            level4: path[3].to_string(),
            metric: metric.into(),
            orphan: false,
        }
    }

    /// A metric with no declared placement: a top-level group named after itself
    pub fn orphan(metric: impl Into<String>) -> Self {
        let metric = metric.into();
        Self {
            level1: metric.clone(),
            level2: String::new(),
            level3: String::new(),
            level4: String::new(),
            metric,
            orphan: true,
        }
    }

    pub fn level(&self, level: Level) -> &str {
        match level {
            Level::Level1 => &self.level1,
            Level::Level2 => &self.level2,
            Level::Level3 => &self.level3,
            Level::Level4 => &self.level4,
        }
    }

    pub fn levels(&self) -> [&str; 4] {
        [&self.level1, &self.level2, &self.level3, &self.level4]
    }
}

/// The mutable working copy of a slot while rules are evaluated for one row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingTuple {
    pub level1: String,
    pub level2: String,
    pub level3: String,
    /// Subsegment placement; never rewritten by from/to rules
    pub level4: String,
    /// Metric label; never rewritten by any rule
    pub metric: String,
}

impl WorkingTuple {
    /// Names a rule may use to address tuple fields
    pub const FIELDS: [&'static str; 5] = ["level1", "level2", "level3", "level4", "metric"];

    pub fn from_slot(slot: &Slot) -> Self {
        Self {
            level1: slot.level1.clone(),
            level2: slot.level2.clone(),
            level3: slot.level3.clone(),
            level4: slot.level4.clone(),
            metric: slot.metric.clone(),
        }
    }

    /// Look up a tuple field by name
    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "level1" => Some(&self.level1),
            "level2" => Some(&self.level2),
            "level3" => Some(&self.level3),
            "level4" => Some(&self.level4),
            "metric" => Some(&self.metric),
            _ => None,
        }
    }

    /// Overwrite one of the relocatable levels
    ///
    /// Returns `false` for anything outside `level1..level3`.
    pub fn set_level(&mut self, field: &str, value: impl Into<String>) -> bool {
        let target = match field {
            "level1" => &mut self.level1,
            "level2" => &mut self.level2,
            "level3" => &mut self.level3,
            _ => return false,
        };
        *target = value.into();
        true
    }
}

/// One original row × one metric, annotated with its resolved hierarchy path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRow {
    /// Dimension columns of the source row (metric columns removed)
    pub dimensions: DataRow,
    pub level1: String,
    pub level2: String,
    pub level3: String,
    pub level4: String,
    /// Metric identity; empty when the slot is an orphan
    pub metric: String,
    /// Column the value was read from
    pub metric_key: String,
    pub value: Option<f64>,
}

impl ProcessedRow {
    pub fn tuple(&self) -> WorkingTuple {
        WorkingTuple {
            level1: self.level1.clone(),
            level2: self.level2.clone(),
            level3: self.level3.clone(),
            level4: self.level4.clone(),
            metric: self.metric_key.clone(),
        }
    }

    /// Write relocated levels back; level4 and metric identity stay as they are
    pub fn apply_tuple(&mut self, tuple: WorkingTuple) {
        self.level1 = tuple.level1;
        self.level2 = tuple.level2;
        self.level3 = tuple.level3;
    }

    pub fn level(&self, level: Level) -> &str {
        match level {
            Level::Level1 => &self.level1,
            Level::Level2 => &self.level2,
            Level::Level3 => &self.level3,
            Level::Level4 => &self.level4,
        }
    }
}

/// A metric as it appears in chart configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricSpec {
    Label(String),
    Object {
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        metric_name: Option<String>,
        #[serde(default)]
        verbose_name: Option<String>,
    },
}

impl MetricSpec {
    /// Stable identifier of the metric
    pub fn label(&self) -> String {
        match self {
            MetricSpec::Label(label) => label.clone(),
            MetricSpec::Object {
                label,
                metric_name,
                verbose_name,
            } => label
                .as_ref()
                .or(metric_name.as_ref())
                .or(verbose_name.as_ref())
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl From<&str> for MetricSpec {
    fn from(label: &str) -> Self {
        MetricSpec::Label(label.to_string())
    }
}

impl From<String> for MetricSpec {
    fn from(label: String) -> Self {
        MetricSpec::Label(label)
    }
}

/// Per-stage execution record kept by the pipeline runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    pub id: String,
    pub rows_in: usize,
    pub rows_out: usize,
    pub in_hash: String,
    pub out_hash: String,
    pub deterministic: bool,
    pub latency_ms: u64,
}

/// Display form of a scalar cell: strings as-is, null as empty
pub fn value_label(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_orphan_slot_is_named_after_metric() {
        let slot = Slot::orphan("revenue");
        assert_eq!(slot.level1, "revenue");
        assert_eq!(slot.metric, "revenue");
        assert!(slot.level2.is_empty() && slot.level3.is_empty() && slot.level4.is_empty());
        assert!(slot.orphan);
    }

    #[test]
    fn test_tuple_refuses_level4_and_metric() {
        let mut tuple = WorkingTuple::from_slot(&Slot::placed(["G", "S", "Seg", "Sub"], "m1"));
        assert!(tuple.set_level("level2", "Other"));
        assert!(!tuple.set_level("level4", "X"));
        assert!(!tuple.set_level("metric", "X"));
        assert_eq!(tuple.level2, "Other");
        assert_eq!(tuple.level4, "Sub");
        assert_eq!(tuple.metric, "m1");
    }

    #[test]
    fn test_metric_spec_label() {
        let specs: Vec<MetricSpec> = serde_json::from_value(json!([
            "plain",
            {"label": "SUM(x)", "metric_name": "sum_x"},
            {"metric_name": "count"},
            {}
        ]))
        .unwrap();
        let labels: Vec<String> = specs.iter().map(MetricSpec::label).collect();
        assert_eq!(labels, vec!["plain", "SUM(x)", "count", ""]);
    }

    #[test]
    fn test_value_label() {
        assert_eq!(value_label(&json!(null)), "");
        assert_eq!(value_label(&json!("EU")), "EU");
        assert_eq!(value_label(&json!(3)), "3");
        assert_eq!(value_label(&json!(true)), "true");
    }
}
