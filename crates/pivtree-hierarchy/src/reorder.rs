//! Reorder planning
//!
//! When a column is dragged to a new position the host persists swaps, not
//! orders. These functions compute the shortest swap list that turns the
//! current order into the requested one.

use crate::groups::GroupIndex;
use crate::swaps::{exchange, validate_swaps, Swap, SwapViolation};
use pivtree_core::Slot;
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    #[error("REORDER/target is not a permutation of the current order")]
    NotAPermutation,

    #[error("REORDER/position {position} is outside 0..{len}")]
    OutOfRange { position: usize, len: usize },

    #[error("REORDER/{} swap(s) cross group boundaries", .0.len())]
    CrossGroup(Vec<SwapViolation>),
}

/// Swaps to persist and the slot order they produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReorderPlan {
    pub delta: Vec<Swap>,
    pub slots: Vec<Slot>,
}

/// Minimal swap list turning `current` into `target`
///
/// Applying the result in order to `current` yields `target`. For distinct
/// items the list has `n - cycles` swaps, which is the minimum.
pub fn swap_delta<T>(current: &[T], target: &[T]) -> Result<Vec<Swap>, ReorderError>
where
    T: Eq + Hash + Clone,
{
    if !is_permutation(current, target) {
        return Err(ReorderError::NotAPermutation);
    }

    let mut working = current.to_vec();
    let mut delta = Vec::new();

    for i in 0..working.len() {
        if working[i] == target[i] {
            continue;
        }
        // Prefer a source that is itself misplaced so duplicates never undo a fix
        let candidates = (i + 1..working.len()).filter(|&j| working[j] == target[i]);
        let source = candidates
            .clone()
            .find(|&j| working[j] != target[j])
            .or_else(|| candidates.clone().next());

        match source {
            Some(j) => {
                working.swap(i, j);
                delta.push(Swap::new(i as i64, j as i64));
            }
            None => return Err(ReorderError::NotAPermutation),
        }
    }

    Ok(delta)
}

fn is_permutation<T: Eq + Hash>(current: &[T], target: &[T]) -> bool {
    if current.len() != target.len() {
        return false;
    }
    let mut counts: HashMap<&T, isize> = HashMap::new();
    for item in current {
        *counts.entry(item).or_default() += 1;
    }
    for item in target {
        *counts.entry(item).or_default() -= 1;
    }
    counts.values().all(|&c| c == 0)
}

/// Move the slot at `from` so it ends up at `to`, shifting the ones between
pub fn plan_move(
    slots: &[Slot],
    groups: Option<&GroupIndex>,
    from: usize,
    to: usize,
) -> Result<ReorderPlan, ReorderError> {
    let len = slots.len();
    for position in [from, to] {
        if position >= len {
            return Err(ReorderError::OutOfRange { position, len });
        }
    }

    let current: Vec<usize> = (0..len).collect();
    let mut target = current.clone();
    let moved = target.remove(from);
    target.insert(to, moved);

    let delta = swap_delta(&current, &target)?;
    finish(slots, groups, delta)
}

/// Plan the swaps that put slots in `target_metrics` order
pub fn plan_reorder(
    slots: &[Slot],
    groups: Option<&GroupIndex>,
    target_metrics: &[String],
) -> Result<ReorderPlan, ReorderError> {
    let current: Vec<&str> = slots.iter().map(|s| s.metric.as_str()).collect();
    let target: Vec<&str> = target_metrics.iter().map(String::as_str).collect();

    let delta = swap_delta(&current, &target)?;
    finish(slots, groups, delta)
}

fn finish(slots: &[Slot], groups: Option<&GroupIndex>, delta: Vec<Swap>) -> Result<ReorderPlan, ReorderError> {
    if let Some(groups) = groups {
        let violations = validate_swaps(&delta, groups);
        if !violations.is_empty() {
            return Err(ReorderError::CrossGroup(violations));
        }
    }

    let mut reordered = slots.to_vec();
    exchange(&mut reordered, &delta);
    Ok(ReorderPlan { delta, slots: reordered })
}

/// Swap list to persist after a delta computed on already-swapped slots
pub fn extend_swaps(existing: &[Swap], delta: &[Swap]) -> Vec<Swap> {
    existing.iter().chain(delta).copied().collect()
}

/// `[[from, to], ...]` as stored in the swaps field
pub fn swaps_to_json(swaps: &[Swap]) -> String {
    serde_json::to_string(swaps).unwrap_or_else(|_| "[]".to_string())
}
