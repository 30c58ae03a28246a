//! Swap Validator & Applier
//!
//! A swap batch is all-or-nothing: if any pair crosses a group boundary the
//! slots come back untouched. Pairs pointing outside the slot list are only
//! skipped, they never reject the batch.

use crate::groups::GroupIndex;
use pivtree_core::{Authored, EngineEvent, ExecutionContext, Slot};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Exchange the items at `from` and `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i64, i64)", into = "(i64, i64)")]
pub struct Swap {
    pub from: i64,
    pub to: i64,
}

impl Swap {
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    /// Both positions as indices into a list of `len` items
    pub fn positions(&self, len: usize) -> Option<(usize, usize)> {
        let from = usize::try_from(self.from).ok().filter(|&i| i < len)?;
        let to = usize::try_from(self.to).ok().filter(|&i| i < len)?;
        Some((from, to))
    }
}

impl From<(i64, i64)> for Swap {
    fn from((from, to): (i64, i64)) -> Self {
        Self { from, to }
    }
}

impl From<Swap> for (i64, i64) {
    fn from(swap: Swap) -> Self {
        (swap.from, swap.to)
    }
}

/// One swap whose endpoints live in different groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("cannot move item from group {from_group} to group {to_group} (swap #{index}: {from} -> {to})")]
pub struct SwapViolation {
    pub index: usize,
    pub from: i64,
    pub to: i64,
    pub from_group: String,
    pub to_group: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    pub slots: Vec<Slot>,
    /// Pairs actually exchanged
    pub applied: usize,
    /// Batch positions of pairs skipped for being out of bounds
    pub skipped: Vec<usize>,
    pub violations: Vec<SwapViolation>,
}

impl SwapOutcome {
    pub fn is_rejected(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Emit one event for a rejected batch and one per skipped pair
    pub fn report(&self, swaps: &[Swap], ctx: &ExecutionContext) {
        if self.is_rejected() {
            ctx.emit(EngineEvent::SwapRejected {
                violations: self.violations.iter().map(ToString::to_string).collect(),
            });
        }
        for &index in &self.skipped {
            if let Some(swap) = swaps.get(index) {
                ctx.emit(EngineEvent::SwapSkipped {
                    index,
                    from: swap.from,
                    to: swap.to,
                    len: self.slots.len(),
                });
            }
        }
    }
}

/// Decode a swap list: `[[a, b], ...]` or `[{"from": a, "to": b}, ...]`
///
/// Entries of any other shape are dropped with a `RuleShapeIgnored` event.
pub fn parse_swaps(value: Value, ctx: &ExecutionContext) -> Result<Vec<Swap>, serde_json::Error> {
    let Value::Array(entries) = value else {
        return Err(serde_json::Error::custom("swaps must be a list of index pairs"));
    };

    let mut swaps = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match swap_from_entry(entry) {
            Ok(swap) => swaps.push(swap),
            Err(reason) => ctx.emit(EngineEvent::RuleShapeIgnored {
                field: "swaps".to_string(),
                index,
                reason: reason.to_string(),
            }),
        }
    }
    Ok(swaps)
}

/// Decode the authored swap field, an unreadable one counts as no swaps
pub fn swaps_from_authored(authored: &Authored, ctx: &ExecutionContext) -> Vec<Swap> {
    authored.decode_with("swaps", ctx, |value| parse_swaps(value, ctx))
}

fn swap_from_entry(entry: &Value) -> Result<Swap, &'static str> {
    let (from, to) = match entry {
        Value::Array(pair) if pair.len() == 2 => (&pair[0], &pair[1]),
        Value::Array(_) => return Err("expected exactly two indices"),
        Value::Object(map) => match (map.get("from"), map.get("to")) {
            (Some(from), Some(to)) => (from, to),
            _ => return Err("expected both `from` and `to`"),
        },
        _ => return Err("expected an index pair"),
    };

    match (integer(from), integer(to)) {
        (Some(from), Some(to)) => Ok(Swap::new(from, to)),
        _ => Err("indices must be integers"),
    }
}

fn integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Every pair whose endpoints resolve to different groups
///
/// Out-of-bounds pairs are not violations; the applier skips them.
pub fn validate_swaps(swaps: &[Swap], groups: &GroupIndex) -> Vec<SwapViolation> {
    swaps
        .iter()
        .enumerate()
        .filter_map(|(index, swap)| {
            let (from, to) = swap.positions(groups.slot_count())?;
            if groups.same_group(from, to) {
                return None;
            }
            Some(SwapViolation {
                index,
                from: swap.from,
                to: swap.to,
                from_group: groups.group_of(from)?.to_string(),
                to_group: groups.group_of(to)?.to_string(),
            })
        })
        .collect()
}

/// Apply `swaps` in order on a copy of `slots`
///
/// With `groups`, the batch is validated first and any violation returns
/// the original slots unchanged.
pub fn apply_swaps(slots: &[Slot], swaps: &[Swap], groups: Option<&GroupIndex>) -> SwapOutcome {
    let violations = groups.map(|g| validate_swaps(swaps, g)).unwrap_or_default();
    if !violations.is_empty() {
        return SwapOutcome {
            slots: slots.to_vec(),
            applied: 0,
            skipped: Vec::new(),
            violations,
        };
    }

    let mut reordered = slots.to_vec();
    let skipped = exchange(&mut reordered, swaps);
    SwapOutcome {
        slots: reordered,
        applied: swaps.len() - skipped.len(),
        skipped,
        violations,
    }
}

/// Exchange in place; returns batch positions of the pairs that were skipped
pub(crate) fn exchange<T>(items: &mut [T], swaps: &[Swap]) -> Vec<usize> {
    let mut skipped = Vec::new();
    for (index, swap) in swaps.iter().enumerate() {
        match swap.positions(items.len()) {
            Some((from, to)) => items.swap(from, to),
            None => skipped.push(index),
        }
    }
    skipped
}
