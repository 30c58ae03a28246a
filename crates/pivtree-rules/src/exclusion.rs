//! Exclusion Filter
//!
//! An exclusion list mixes two dialects:
//! - scalars (`"Competitor"`): drop the row × metric when any dimension
//!   value normalizes to one of them
//! - objects (`{"key": "platform", "values": ["Bing"]}`): drop it when the
//!   named field does
//!
//! Blank values never exclude anything.

use crate::authored;
use crate::fields::field_value;
use crate::normalizer::{match_key, value_key};
use crate::rule::ValueSet;
use pivtree_core::{Authored, DataRow, ExecutionContext, WorkingTuple};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExclusionRule {
    /// Matches any dimension value
    Value(String),
    /// Matches one field of the tuple or the row
    Keyed { key: String, values: ValueSet },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionSet {
    flat: HashSet<String>,
    keyed: Vec<(String, ValueSet)>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_authored(authored: &Authored, ctx: &ExecutionContext) -> Self {
        let mut set = Self::new();
        for (index, entry) in authored::list(authored, "exclusions", ctx).into_iter().enumerate() {
            match compile(&entry) {
                Ok(Some(rule)) => set.push(rule),
                Ok(None) => {}
                Err(reason) => authored::ignore(ctx, "exclusions", index, reason),
            }
        }
        set
    }

    pub fn push(&mut self, rule: ExclusionRule) {
        match rule {
            ExclusionRule::Value(key) => {
                self.flat.insert(key);
            }
            ExclusionRule::Keyed { key, values } => self.keyed.push((key, values)),
        }
    }

    /// Whether this row × metric must be dropped
    pub fn is_excluded(&self, tuple: &WorkingTuple, dimensions: &DataRow) -> bool {
        if !self.flat.is_empty() && dimensions.values().any(|v| self.flat.contains(&value_key(v))) {
            return true;
        }
        self.keyed.iter().any(|(key, values)| {
            field_value(key, tuple, dimensions).map_or(false, |actual| values.matches(&actual))
        })
    }

    pub fn len(&self) -> usize {
        self.flat.len() + self.keyed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `Ok(None)` for entries that are valid but can never match
fn compile(entry: &Value) -> Result<Option<ExclusionRule>, &'static str> {
    match entry {
        Value::Object(map) => {
            let key = match map.get("key") {
                Some(Value::String(key)) if !key.trim().is_empty() => key.clone(),
                _ => return Err("expected a non-empty `key`"),
            };
            let values = map
                .get("values")
                .or_else(|| map.get("value"))
                .ok_or("expected `values`")?;
            let values = ValueSet::from_value(values).without_empty();
            Ok((!values.is_empty()).then_some(ExclusionRule::Keyed { key, values }))
        }
        Value::Array(_) => Err("nested lists are not exclusion rules"),
        scalar => {
            let key = value_key(scalar);
            Ok((!key.is_empty()).then_some(ExclusionRule::Value(key)))
        }
    }
}

impl FromIterator<ExclusionRule> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = ExclusionRule>>(iter: I) -> Self {
        let mut set = Self::new();
        for rule in iter {
            set.push(rule);
        }
        set
    }
}

impl ExclusionRule {
    /// Flat rule from raw text
    pub fn value(text: &str) -> Self {
        ExclusionRule::Value(match_key(text))
    }
}
