//! Hierarchy Parser
//!
//! Walks groups → subgroups → segments → subsegments depth-first and hands
//! out metrics positionally: every leaf with a count takes that many metrics
//! from the front of what is left. Metrics nobody claimed become orphans.

use crate::description::{HierarchyDescription, SubgroupNode};
use pivtree_core::{OrderedSet, Slot};
use serde::{Deserialize, Serialize};

/// Level and metric order as authored in the hierarchy description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalOrder {
    pub level1: OrderedSet,
    pub level2: OrderedSet,
    pub level3: OrderedSet,
    pub level4: OrderedSet,
    pub metrics: OrderedSet,
}

impl CanonicalOrder {
    /// Replace the metric order with the order of the given slots
    pub fn with_slot_metrics(mut self, slots: &[Slot]) -> Self {
        self.metrics = slots.iter().map(|s| s.metric.clone()).collect();
        self
    }
}

/// Everything the parser learns in one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyParse {
    pub slots: Vec<Slot>,
    /// Sum of every count the description asked for
    pub declared: usize,
    pub canonical: CanonicalOrder,
}

impl HierarchyParse {
    /// Whether the description and the metric list disagree on size
    pub fn is_mismatched(&self) -> bool {
        self.declared != self.slots.len() || self.slots.iter().any(|s| s.orphan)
    }
}

struct MetricCursor<'a> {
    metrics: &'a [String],
    next: usize,
}

impl<'a> MetricCursor<'a> {
    fn take(&mut self, count: usize) -> &'a [String] {
        let end = self.next.saturating_add(count).min(self.metrics.len());
        let taken = &self.metrics[self.next..end];
        self.next = end;
        taken
    }

    fn rest(&mut self) -> &'a [String] {
        let rest = &self.metrics[self.next..];
        self.next = self.metrics.len();
        rest
    }
}

/// Parse into one slot per metric, in metric order
pub fn parse(description: &HierarchyDescription, metrics: &[String], show_segments: bool) -> Vec<Slot> {
    parse_detailed(description, metrics, show_segments).slots
}

/// Parse and also report declared size and canonical order
pub fn parse_detailed(
    description: &HierarchyDescription,
    metrics: &[String],
    show_segments: bool,
) -> HierarchyParse {
    let mut cursor = MetricCursor { metrics, next: 0 };
    let mut out = HierarchyParse::default();

    for group in &description.groups {
        insert_title(&mut out.canonical.level1, &group.title);

        if group.subgroups.is_empty() {
            if let Some(count) = group.count {
                emit(&mut out, &mut cursor, count, [group.title.as_str(), "", "", ""]);
            }
            continue;
        }

        for subgroup in &group.subgroups {
            record_subgroup_titles(&mut out.canonical, subgroup);

            if show_segments && subgroup.declares_segments() {
                for segment in &subgroup.segments {
                    if segment.subsegments.is_empty() {
                        if let Some(count) = segment.count {
                            let path = [group.title.as_str(), subgroup.title.as_str(), segment.title.as_str(), ""];
                            emit(&mut out, &mut cursor, count, path);
                        }
                        continue;
                    }
                    for subsegment in &segment.subsegments {
                        if let Some(count) = subsegment.count {
                            let path = [
                                group.title.as_str(),
                                subgroup.title.as_str(),
                                segment.title.as_str(),
                                subsegment.title.as_str(),
                            ];
                            emit(&mut out, &mut cursor, count, path);
                        }
                    }
                }
            } else if let Some(count) = subgroup.declared_count() {
                let path = [group.title.as_str(), subgroup.title.as_str(), "", ""];
                emit(&mut out, &mut cursor, count, path);
            }
        }
    }

    out.slots.extend(cursor.rest().iter().map(Slot::orphan));
    out.canonical.metrics = out.slots.iter().map(|s| s.metric.clone()).collect();
    out
}

fn emit(out: &mut HierarchyParse, cursor: &mut MetricCursor<'_>, count: usize, path: [&str; 4]) {
    out.declared = out.declared.saturating_add(count);
    out.slots
        .extend(cursor.take(count).iter().map(|metric| Slot::placed(path, metric.as_str())));
}

fn record_subgroup_titles(canonical: &mut CanonicalOrder, subgroup: &SubgroupNode) {
    insert_title(&mut canonical.level2, &subgroup.title);
    for segment in &subgroup.segments {
        insert_title(&mut canonical.level3, &segment.title);
        for subsegment in &segment.subsegments {
            insert_title(&mut canonical.level4, &subsegment.title);
        }
    }
}

fn insert_title(order: &mut OrderedSet, title: &str) {
    if !title.is_empty() {
        order.insert(title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metrics(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn description(value: serde_json::Value) -> HierarchyDescription {
        HierarchyDescription::from_value(value).unwrap()
    }

    #[test]
    fn test_single_segment_takes_all() {
        let desc = description(json!({"groups": [{"title": "G1", "subgroups": [
            {"title": "S1", "segments": [{"title": "Seg1", "count": 3}]}
        ]}]}));
        let slots = parse(&desc, &metrics(&["m1", "m2", "m3"]), true);
        assert_eq!(slots.len(), 3);
        for (slot, metric) in slots.iter().zip(["m1", "m2", "m3"]) {
            assert_eq!(slot.levels(), ["G1", "S1", "Seg1", ""]);
            assert_eq!(slot.metric, metric);
        }
    }

    #[test]
    fn test_leftover_metrics_become_orphans() {
        let desc = description(json!({"groups": [{"title": "G1", "subgroups": [
            {"title": "S1", "segments": [{"title": "Seg1", "count": 1}]}
        ]}]}));
        let parsed = parse_detailed(&desc, &metrics(&["m1", "m2"]), true);
        assert_eq!(parsed.slots[0], Slot::placed(["G1", "S1", "Seg1", ""], "m1"));
        assert_eq!(parsed.slots[1], Slot::orphan("m2"));
        assert_eq!(parsed.declared, 1);
        assert!(parsed.is_mismatched());
    }

    #[test]
    fn test_overdeclared_counts_stop_at_metric_list() {
        let desc = description(json!([{"title": "G", "count": 5}]));
        let parsed = parse_detailed(&desc, &metrics(&["a", "b"]), true);
        assert_eq!(parsed.slots.len(), 2);
        assert_eq!(parsed.declared, 5);
        assert!(parsed.slots.iter().all(|s| s.level1 == "G" && !s.orphan));
    }

    #[test]
    fn test_hidden_segments_sum_into_subgroup() {
        let desc = description(json!({"groups": [{"title": "G", "subgroups": [
            {"title": "S1", "segments": [
                {"title": "A", "count": 1},
                {"title": "B", "subsegments": [{"title": "b1", "count": 1}, {"title": "b2", "count": 1}]}
            ]},
            {"title": "S2", "segments": [{"title": "C", "count": 1}]}
        ]}]}));
        let slots = parse(&desc, &metrics(&["m1", "m2", "m3", "m4"]), false);
        let paths: Vec<[&str; 4]> = slots.iter().map(Slot::levels).collect();
        assert_eq!(paths, vec![
            ["G", "S1", "", ""],
            ["G", "S1", "", ""],
            ["G", "S1", "", ""],
            ["G", "S2", "", ""],
        ]);
    }

    #[test]
    fn test_subsegments_fill_level4() {
        let desc = description(json!({"groups": [{"title": "G", "subgroups": [
            {"title": "S", "segments": [
                {"title": "Seg", "count": 99, "subsegments": [{"title": "x", "count": 1}, {"title": "y", "count": 1}]}
            ]}
        ]}]}));
        let slots = parse(&desc, &metrics(&["m1", "m2"]), true);
        assert_eq!(slots[0].levels(), ["G", "S", "Seg", "x"]);
        assert_eq!(slots[1].levels(), ["G", "S", "Seg", "y"]);
    }

    #[test]
    fn test_branch_without_count_or_segments_is_skipped() {
        let desc = description(json!({"groups": [
            {"title": "Empty", "subgroups": [{"title": "Nothing"}]},
            {"title": "G", "subgroups": [{"title": "S", "count": 1}]}
        ]}));
        let parsed = parse_detailed(&desc, &metrics(&["m1"]), true);
        assert_eq!(parsed.slots, vec![Slot::placed(["G", "S", "", ""], "m1")]);
        assert!(!parsed.is_mismatched());
        assert_eq!(parsed.canonical.level1.as_slice(), &["Empty".to_string(), "G".to_string()]);
    }

    #[test]
    fn test_canonical_order_follows_traversal() {
        let desc = description(json!({"groups": [{"title": "G", "subgroups": [
            {"title": "S1", "segments": [{"title": "Zeta", "count": 1}, {"title": "Alpha", "count": 1}]},
            {"title": "S2", "segments": [{"title": "Alpha", "count": 1}, {"title": "Mid", "count": 1}]}
        ]}]}));
        let parsed = parse_detailed(&desc, &metrics(&["a", "b", "c", "d"]), true);
        let level3: Vec<&str> = parsed.canonical.level3.iter().collect();
        assert_eq!(level3, vec!["Zeta", "Alpha", "Mid"]);
        let metric_order: Vec<&str> = parsed.canonical.metrics.iter().collect();
        assert_eq!(metric_order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_empty_description_orphans_everything() {
        let slots = parse(&HierarchyDescription::default(), &metrics(&["x", "y"]), true);
        assert_eq!(slots, vec![Slot::orphan("x"), Slot::orphan("y")]);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let huge = "18446744073709551615";
        let flat = description(json!({"groups": [
            {"title": "A", "count": huge},
            {"title": "B", "count": huge}
        ]}));
        let nested = description(json!({"groups": [{"title": "G", "subgroups": [{"title": "S", "segments": [
            {"title": "X", "count": huge},
            {"title": "Y", "subsegments": [{"title": "y1", "count": huge}, {"title": "y2", "count": huge}]}
        ]}]}]}));

        for show_segments in [true, false] {
            for desc in [&flat, &nested] {
                let parsed = parse_detailed(desc, &metrics(&["m1"]), show_segments);
                assert_eq!(parsed.declared, usize::MAX);
                assert_eq!(parsed.slots.len(), 1);
                assert!(!parsed.slots[0].orphan);
            }
        }
    }
}
