//! Pivtree Rules: everything that acts on one data row × one metric
//!
//! - [`normalizer`]: the match key every comparison goes through
//! - [`authored`]: defensive decoding of rule lists typed by dashboard authors
//! - [`rule`] and [`relocate`]: retarget a row's hierarchy position
//! - [`exclusion`]: drop row × metric combinations

pub mod authored;
pub mod exclusion;
pub mod fields;
pub mod normalizer;
pub mod relocate;
pub mod rule;

pub use exclusion::{ExclusionRule, ExclusionSet};
pub use fields::field_value;
pub use normalizer::{match_key, value_key};
pub use relocate::{relocate, RelocationOutcome};
pub use rule::{CompiledRule, FromToRule, Pattern, RuleSet, ValueSet, WhenSetRule};
