//! Defensive decoding of authored rule lists
//!
//! A list field that does not parse is an empty list plus a
//! `ConfigParseFailed` event; a list entry of the wrong shape is dropped with
//! a `RuleShapeIgnored` event. Neither ever fails the caller.

use pivtree_core::{Authored, EngineEvent, ExecutionContext};
use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;

/// The entries of an authored JSON list
pub fn list(authored: &Authored, field: &str, ctx: &ExecutionContext) -> Vec<Value> {
    authored.decode_with(field, ctx, |value| match value {
        Value::Array(entries) => Ok(entries),
        _ => Err(serde_json::Error::custom(format!("{field} must be a list"))),
    })
}

/// Decode every entry of an authored list, keeping its position
pub fn entries<T>(authored: &Authored, field: &str, ctx: &ExecutionContext) -> Vec<(usize, T)>
where
    T: DeserializeOwned,
{
    list(authored, field, ctx)
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(decoded) => Some((index, decoded)),
            Err(e) => {
                ignore(ctx, field, index, e.to_string());
                None
            }
        })
        .collect()
}

/// Report a dropped entry
pub fn ignore(ctx: &ExecutionContext, field: &str, index: usize, reason: impl Into<String>) {
    ctx.emit(EngineEvent::RuleShapeIgnored {
        field: field.to_string(),
        index,
        reason: reason.into(),
    });
}
