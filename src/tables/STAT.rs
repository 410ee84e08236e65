use crate::types::Tag;
use std::collections::BTreeMap;

/// A design axis record in the style attributes table
#[derive(Debug, PartialEq, Clone)]
pub struct AxisRecord {
    pub axisTag: Tag,
    pub axisNameID: u16,
    pub axisOrdering: u16,
}

/// An axis value table, naming a location (or range) on one or more axes
///
/// Formats 1-3 address a single axis through `axis_index`; format 4 carries
/// a set of per-axis `locations`. Unknown formats are preserved untouched.
#[derive(Debug, PartialEq, Clone)]
pub struct AxisValue {
    pub format: u16,
    pub axis_index: Option<u16>,
    pub flags: u16,
    pub name_id: u16,
    /// The value, for formats 1 and 3.
    pub value: Option<f32>,
    /// The nominal value, for format 2.
    pub nominal_value: Option<f32>,
    pub range_min_value: Option<f32>,
    pub range_max_value: Option<f32>,
    /// The linked value, for format 3.
    pub linked_value: Option<f32>,
    /// Axis-index-to-value pairs, for format 4.
    pub locations: Option<BTreeMap<u16, f32>>,
}

/// Represents a font's STAT (Style Attributes) table
#[derive(Debug, PartialEq, Clone, Default)]
pub struct STAT {
    pub design_axes: Vec<AxisRecord>,
    pub axis_values: Vec<AxisValue>,
    pub elided_fallback_name_id: Option<u16>,
}
