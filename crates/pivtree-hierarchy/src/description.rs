//! Hierarchy description as authored by dashboard users
//!
//! Authors write these by hand, so decoding is lenient: titles may be
//! numbers, counts may be numeric strings, lists may be `null`.

use pivtree_core::{Authored, ExecutionContext};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyDescription {
    #[serde(default, deserialize_with = "lenient_list")]
    pub groups: Vec<GroupNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupNode {
    #[serde(default, deserialize_with = "lenient_title")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub subgroups: Vec<SubgroupNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgroupNode {
    #[serde(default, deserialize_with = "lenient_title")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub segments: Vec<SegmentNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentNode {
    #[serde(default, deserialize_with = "lenient_title")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub subsegments: Vec<SubsegmentNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsegmentNode {
    #[serde(default, deserialize_with = "lenient_title")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl SegmentNode {
    /// Slots this segment declares: the sum of its subsegments when it has any
    pub fn declared_count(&self) -> Option<usize> {
        if self.subsegments.is_empty() {
            return self.count;
        }
        self.subsegments
            .iter()
            .filter_map(|s| s.count)
            .fold(None, |acc, c| Some(acc.unwrap_or(0).saturating_add(c)))
    }
}

impl SubgroupNode {
    /// Whether any segment below this subgroup declares a count
    pub fn declares_segments(&self) -> bool {
        self.segments.iter().any(|s| s.declared_count().is_some())
    }

    /// Slots this subgroup declares when segment detail is collapsed
    pub fn declared_count(&self) -> Option<usize> {
        if !self.declares_segments() {
            return self.count;
        }
        Some(
            self.segments
                .iter()
                .filter_map(SegmentNode::declared_count)
                .fold(0, usize::saturating_add),
        )
    }
}

impl HierarchyDescription {
    /// Accepts `{"groups": [...]}`, a bare list of groups, or a single group object
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let wrapped = value.get("groups").is_some();
        match value {
            Value::Array(_) => Ok(Self {
                groups: serde_json::from_value(value)?,
            }),
            Value::Object(_) if wrapped => serde_json::from_value(value),
            Value::Object(_) => Ok(Self {
                groups: vec![serde_json::from_value(value)?],
            }),
            Value::Null => Ok(Self::default()),
            other => Err(serde_json::Error::custom(format!(
                "expected an object or a list of groups, found {}",
                kind_of(&other)
            ))),
        }
    }

    /// Decode an authored field; anything malformed becomes an empty description
    pub fn from_authored(authored: &Authored, ctx: &ExecutionContext) -> Self {
        authored.decode_with("hierarchy", ctx, Self::from_value)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn lenient_title<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count_from_value))
}

fn count_from_value(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n as usize).or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as usize)
        }),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_three_top_level_shapes() {
        let wrapped = HierarchyDescription::from_value(json!({"groups": [{"title": "G1", "count": 2}]})).unwrap();
        let bare = HierarchyDescription::from_value(json!([{"title": "G1", "count": 2}])).unwrap();
        let single = HierarchyDescription::from_value(json!({"title": "G1", "count": 2})).unwrap();
        assert_eq!(wrapped, bare);
        assert_eq!(wrapped, single);
        assert_eq!(wrapped.groups[0].count, Some(2));
    }

    #[test]
    fn test_lenient_fields() {
        let description = HierarchyDescription::from_value(json!({
            "groups": [{
                "title": 2024,
                "subgroups": [{"title": "S", "count": "3", "segments": null}],
            }, {
                "title": null,
                "count": -1,
            }]
        }))
        .unwrap();
        assert_eq!(description.groups[0].title, "2024");
        assert_eq!(description.groups[0].subgroups[0].count, Some(3));
        assert!(description.groups[0].subgroups[0].segments.is_empty());
        assert_eq!(description.groups[1].title, "");
        assert_eq!(description.groups[1].count, None);
    }

    #[test]
    fn test_rejects_scalars() {
        assert!(HierarchyDescription::from_value(json!("groups")).is_err());
        assert!(HierarchyDescription::from_value(json!(null)).unwrap().is_empty());
    }

    #[test]
    fn test_declared_counts() {
        let segment: SegmentNode = serde_json::from_value(json!({
            "title": "Seg", "count": 9,
            "subsegments": [{"title": "a", "count": 1}, {"title": "b", "count": 2}]
        }))
        .unwrap();
        assert_eq!(segment.declared_count(), Some(3));

        let subgroup: SubgroupNode = serde_json::from_value(json!({
            "title": "S", "count": 7, "segments": [{"title": "x"}]
        }))
        .unwrap();
        assert!(!subgroup.declares_segments());
        assert_eq!(subgroup.declared_count(), Some(7));
    }
}
