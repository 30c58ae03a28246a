//! Relocation rules
//!
//! Two dialects arrive from authored JSON:
//!
//! ```json
//! {"from": {"level1": "Media", "platform": ["Meta", "TikTok"]}, "to": {"level2": "Social"}}
//! {"when": {"region": "North"}, "set": {"level3": "Regional"}}
//! ```
//!
//! Both are compiled once into normalized form. From/to fields that are
//! absent or falsy match anything; when/set values must match exactly.

use crate::authored;
use crate::normalizer::{match_key, value_key};
use pivtree_core::{value_label, Authored, EngineEvent, ExecutionContext, Level};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Normalized set of accepted values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValueSet(BTreeSet<String>);

impl ValueSet {
    /// A scalar is one value, a list is any of its items
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self(items.iter().map(value_key).collect()),
            scalar => Self(std::iter::once(value_key(scalar)).collect()),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    /// Whether raw `text` normalizes to one of the values
    pub fn matches(&self, text: &str) -> bool {
        self.contains_key(&match_key(text))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn without_empty(mut self) -> Self {
        self.0.remove("");
        self
    }
}

/// A `from` field: wildcard, or a set of accepted values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum Pattern {
    #[default]
    Any,
    OneOf(ValueSet),
}

impl Pattern {
    /// Null, false, zero, blank text and empty lists are wildcards
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Pattern::Any;
        };
        if is_falsy(value) {
            return Pattern::Any;
        }
        let values = ValueSet::from_value(value).without_empty();
        if values.is_empty() {
            Pattern::Any
        } else {
            Pattern::OneOf(values)
        }
    }

    pub fn matches(&self, actual: Option<&str>) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::OneOf(values) => actual.map_or(false, |a| values.matches(a)),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Pattern::Any)
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(_) => false,
    }
}

/// `{"from": {...}, "to": {...}}`: retarget level1..level3 on the first match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FromToRule {
    pub index: usize,
    pub level1: Pattern,
    pub level2: Pattern,
    pub level3: Pattern,
    pub platform: Pattern,
    pub metric: Pattern,
    /// Extra predicates over named fields
    pub conditions: Vec<(String, Pattern)>,
    /// Levels to overwrite, in authored order
    pub to: Vec<(Level, String)>,
}

/// `{"when": {...}, "set": {...}}`: every matching rule applies, in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WhenSetRule {
    pub index: usize,
    /// All must hold; an empty `when` always holds
    pub when: Vec<(String, ValueSet)>,
    pub set: Vec<(String, Value)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CompiledRule {
    FromTo(FromToRule),
    WhenSet(WhenSetRule),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawRule {
    FromTo { from: RawFrom, to: Map<String, Value> },
    WhenSet { when: Map<String, Value>, set: Map<String, Value> },
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawFrom {
    level1: Option<Value>,
    level2: Option<Value>,
    level3: Option<Value>,
    platform: Option<Value>,
    metric: Option<Value>,
    conditions: Option<RawConditions>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawConditions {
    Map(Map<String, Value>),
    List(Vec<RawCondition>),
}

#[derive(Debug, Clone, Deserialize)]
struct RawCondition {
    key: String,
    #[serde(alias = "value")]
    values: Value,
}

impl RawConditions {
    fn compile(self) -> Vec<(String, Pattern)> {
        let pairs: Vec<(String, Value)> = match self {
            RawConditions::Map(map) => map.into_iter().collect(),
            RawConditions::List(list) => list.into_iter().map(|c| (c.key, c.values)).collect(),
        };
        pairs
            .into_iter()
            .map(|(key, value)| (key, Pattern::from_value(Some(&value))))
            .filter(|(_, pattern)| !pattern.is_any())
            .collect()
    }
}

impl CompiledRule {
    fn compile(raw: RawRule, index: usize, field: &str, ctx: &ExecutionContext) -> Self {
        match raw {
            RawRule::FromTo { from, to } => CompiledRule::FromTo(FromToRule {
                index,
                level1: Pattern::from_value(from.level1.as_ref()),
                level2: Pattern::from_value(from.level2.as_ref()),
                level3: Pattern::from_value(from.level3.as_ref()),
                platform: Pattern::from_value(from.platform.as_ref()),
                metric: Pattern::from_value(from.metric.as_ref()),
                conditions: from.conditions.map(RawConditions::compile).unwrap_or_default(),
                to: compile_targets(to, field, ctx),
            }),
            RawRule::WhenSet { when, set } => CompiledRule::WhenSet(WhenSetRule {
                index,
                when: when
                    .iter()
                    .map(|(key, value)| (key.clone(), ValueSet::from_value(value)))
                    .collect(),
                set: compile_assignments(set, field, ctx),
            }),
        }
    }
}

fn compile_targets(to: Map<String, Value>, field: &str, ctx: &ExecutionContext) -> Vec<(Level, String)> {
    to.into_iter()
        .filter(|(_, value)| !value.is_null())
        .filter_map(|(key, value)| match Level::parse(&key) {
            Some(level @ (Level::Level1 | Level::Level2 | Level::Level3)) => Some((level, value_label(&value))),
            _ => {
                refuse(ctx, field, &key);
                None
            }
        })
        .collect()
}

fn compile_assignments(set: Map<String, Value>, field: &str, ctx: &ExecutionContext) -> Vec<(String, Value)> {
    set.into_iter()
        .filter(|(key, _)| {
            let locked = matches!(key.as_str(), "level4" | "metric");
            if locked {
                refuse(ctx, field, key);
            }
            !locked
        })
        .collect()
}

fn refuse(ctx: &ExecutionContext, field: &str, key: &str) {
    ctx.emit(EngineEvent::RuleFieldIgnored {
        field: format!("{field}.{key}"),
    });
}

/// Every relocation rule of a configuration, compiled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    /// Platform rules first, then from/to relocation rules
    pub from_to: Vec<FromToRule>,
    pub when_set: Vec<WhenSetRule>,
    pub platform_column: String,
}

impl RuleSet {
    pub fn new() -> Self {
        Self {
            platform_column: "platform".to_string(),
            ..Self::default()
        }
    }

    /// Compile the two authored rule fields
    pub fn from_authored(platform_rules: &Authored, relocation_rules: &Authored, ctx: &ExecutionContext) -> Self {
        let mut rules = Self::new();
        rules.extend_authored(platform_rules, "platformRules", ctx);
        rules.extend_authored(relocation_rules, "relocationRules", ctx);
        rules
    }

    pub fn with_platform_column(mut self, column: impl Into<String>) -> Self {
        self.platform_column = column.into();
        self
    }

    /// Append the rules of one authored list
    pub fn extend_authored(&mut self, authored: &Authored, field: &str, ctx: &ExecutionContext) {
        for (index, raw) in authored::entries::<RawRule>(authored, field, ctx) {
            self.push(CompiledRule::compile(raw, index, field, ctx));
        }
    }

    pub fn push(&mut self, rule: CompiledRule) {
        match rule {
            CompiledRule::FromTo(rule) => self.from_to.push(rule),
            CompiledRule::WhenSet(rule) => self.when_set.push(rule),
        }
    }

    pub fn len(&self) -> usize {
        self.from_to.len() + self.when_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
