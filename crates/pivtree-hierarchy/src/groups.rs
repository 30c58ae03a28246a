//! Group Indexer
//!
//! A group is the set of slots sharing a structural path. It is the unit
//! within which reordering is legal. Grouping never looks at the metric.

use pivtree_core::Slot;
use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_GROUP_SEPARATOR: &str = " / ";

fn key_depth(slot: &Slot, show_segments: bool) -> usize {
    if show_segments && !slot.level4.is_empty() {
        4
    } else if show_segments && !slot.level3.is_empty() {
        3
    } else if !slot.level2.is_empty() {
        2
    } else {
        1
    }
}

/// Structural identity of a slot: its levels down to the key depth
///
/// The depth is the deepest level that is both present and visible;
/// level4/level3 only count while segments are shown. Empty levels are
/// kept so `G//Seg` and `G/Seg/` stay apart.
pub fn group_path(slot: &Slot, show_segments: bool) -> Vec<String> {
    slot.levels()[..key_depth(slot, show_segments)]
        .iter()
        .map(|level| level.to_string())
        .collect()
}

/// Display key of a slot's group: the non-empty levels of its path joined
pub fn group_key(slot: &Slot, show_segments: bool, separator: &str) -> String {
    slot.levels()[..key_depth(slot, show_segments)]
        .iter()
        .filter(|level| !level.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(separator)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    /// Display key; two groups may share one
    pub key: String,
    pub path: Vec<String>,
    /// Slot indices in slot order
    pub members: Vec<usize>,
}

/// Groups by structural path, plus the group of every slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupIndex {
    groups: Vec<Group>,
    slot_groups: Vec<usize>,
    #[serde(skip)]
    lookup: HashMap<Vec<String>, usize>,
}

impl GroupIndex {
    /// Groups in order of first appearance
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Group containing the slot at `index`
    pub fn group(&self, index: usize) -> Option<&Group> {
        self.slot_groups.get(index).and_then(|&position| self.groups.get(position))
    }

    /// Display key of the group containing the slot at `index`
    pub fn group_of(&self, index: usize) -> Option<&str> {
        self.group(index).map(|group| group.key.as_str())
    }

    /// Members of the group at `path`
    pub fn members<S: AsRef<str>>(&self, path: &[S]) -> Option<&[usize]> {
        let path: Vec<String> = path.iter().map(|level| level.as_ref().to_string()).collect();
        self.lookup
            .get(&path)
            .and_then(|&position| self.groups.get(position))
            .map(|group| group.members.as_slice())
    }

    pub fn same_group(&self, a: usize, b: usize) -> bool {
        matches!((self.slot_groups.get(a), self.slot_groups.get(b)), (Some(x), Some(y)) if x == y)
    }

    /// Number of indexed slots
    pub fn slot_count(&self) -> usize {
        self.slot_groups.len()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

pub fn index_groups(slots: &[Slot], show_segments: bool) -> GroupIndex {
    index_groups_with(slots, show_segments, DEFAULT_GROUP_SEPARATOR)
}

pub fn index_groups_with(slots: &[Slot], show_segments: bool, separator: &str) -> GroupIndex {
    let mut index = GroupIndex::default();

    for (position, slot) in slots.iter().enumerate() {
        let path = group_path(slot, show_segments);
        let group = match index.lookup.get(&path) {
            Some(&group) => group,
            None => {
                let group = index.groups.len();
                index.lookup.insert(path.clone(), group);
                index.groups.push(Group {
                    key: group_key(slot, show_segments, separator),
                    path,
                    members: Vec::new(),
                });
                group
            }
        };
        index.groups[group].members.push(position);
        index.slot_groups.push(group);
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots() -> Vec<Slot> {
        vec![
            Slot::placed(["G1", "S1", "Seg1", ""], "m1"),
            Slot::placed(["G1", "S1", "Seg2", ""], "m2"),
            Slot::placed(["G1", "S1", "Seg1", ""], "m3"),
            Slot::placed(["G1", "S2", "Seg1", "x"], "m4"),
            Slot::orphan("m5"),
        ]
    }

    #[test]
    fn test_key_depth_follows_show_segments() {
        let slot = Slot::placed(["G1", "S2", "Seg1", "x"], "m4");
        assert_eq!(group_key(&slot, true, "/"), "G1/S2/Seg1/x");
        assert_eq!(group_key(&slot, false, "/"), "G1/S2");
        assert_eq!(group_key(&Slot::orphan("m5"), true, "/"), "m5");
    }

    #[test]
    fn test_index_with_segments() {
        let index = index_groups(&slots(), true);
        assert_eq!(index.len(), 4);
        assert_eq!(index.members(&["G1", "S1", "Seg1"]), Some(&[0, 2][..]));
        assert_eq!(index.group_of(1), Some("G1 / S1 / Seg2"));
        assert!(index.same_group(0, 2));
        assert!(!index.same_group(0, 1));
        assert!(!index.same_group(0, 99));
    }

    #[test]
    fn test_index_without_segments_merges_branches() {
        let index = index_groups(&slots(), false);
        let keys: Vec<&str> = index.groups().iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["G1 / S1", "G1 / S2", "m5"]);
        assert_eq!(index.members(&["G1", "S1"]), Some(&[0, 1, 2][..]));
    }

    #[test]
    fn test_grouping_ignores_metric_identity() {
        let a = Slot::placed(["G", "S", "", ""], "one");
        let b = Slot::placed(["G", "S", "", ""], "two");
        let index = index_groups(&[a, b], true);
        assert_eq!(index.len(), 1);
        assert_eq!(index.slot_count(), 2);
    }

    #[test]
    fn test_colliding_titles_stay_apart() {
        let slots = vec![
            Slot::placed(["A / B", "", "", ""], "m1"),
            Slot::placed(["A", "B", "", ""], "m2"),
            Slot::placed(["G", "", "Seg", ""], "m3"),
            Slot::placed(["G", "Seg", "", ""], "m4"),
            Slot::orphan("A / B"),
        ];
        let index = index_groups(&slots, true);

        assert_eq!(index.group_of(0), index.group_of(1));
        assert!(!index.same_group(0, 1));
        assert!(!index.same_group(2, 3));
        assert!(index.same_group(0, 4));
        assert_eq!(index.len(), 4);
        assert_eq!(index.members(&["A", "B"]), Some(&[1][..]));
    }
}
