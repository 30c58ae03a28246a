//! Pivtree Hierarchy: from a flat metric list to ordered header slots
//!
//! # Flow
//!
//! ```text
//! metrics + description → parse → slots → index_groups → groups
//!                                   ↓                      ↓
//!                                apply_swaps ←─────────────┘
//!                                   ↓
//!                            reordered slots → swap_delta / plan_move
//! ```
//!
//! # Example
//!
//! ```
//! use pivtree_hierarchy::{apply_swaps, index_groups, parse, HierarchyDescription, Swap};
//! use serde_json::json;
//!
//! let description = HierarchyDescription::from_value(json!({
//!     "groups": [{"title": "G1", "subgroups": [
//!         {"title": "S1", "segments": [{"title": "Seg1", "count": 3}]}
//!     ]}]
//! })).unwrap();
//! let metrics = vec!["m1".to_string(), "m2".to_string(), "m3".to_string()];
//!
//! let slots = parse(&description, &metrics, true);
//! let groups = index_groups(&slots, true);
//! let outcome = apply_swaps(&slots, &[Swap::new(0, 2)], Some(&groups));
//!
//! let order: Vec<&str> = outcome.slots.iter().map(|s| s.metric.as_str()).collect();
//! assert_eq!(order, vec!["m3", "m2", "m1"]);
//! ```

pub mod description;
pub mod groups;
pub mod parser;
pub mod reorder;
pub mod swaps;

pub use description::{GroupNode, HierarchyDescription, SegmentNode, SubgroupNode, SubsegmentNode};
pub use groups::{group_key, group_path, index_groups, index_groups_with, Group, GroupIndex, DEFAULT_GROUP_SEPARATOR};
pub use parser::{parse, parse_detailed, CanonicalOrder, HierarchyParse};
pub use reorder::{extend_swaps, plan_move, plan_reorder, swap_delta, swaps_to_json, ReorderError, ReorderPlan};
pub use swaps::{
    apply_swaps, parse_swaps, swaps_from_authored, validate_swaps, Swap, SwapOutcome, SwapViolation,
};
