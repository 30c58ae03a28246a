//! Field lookup shared by relocation and exclusion rules

use pivtree_core::{value_label, DataRow, WorkingTuple};

/// Current value of `field`: a tuple field when the name is one, otherwise
/// a dimension column. Missing columns read as `None`.
pub fn field_value(field: &str, tuple: &WorkingTuple, dimensions: &DataRow) -> Option<String> {
    tuple
        .get(field)
        .map(str::to_string)
        .or_else(|| dimensions.get(field).map(value_label))
}
