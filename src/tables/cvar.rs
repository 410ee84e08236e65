use crate::otvar::TupleVariation;

/// Represents a font's cvar (CVT Variations) table, describing how the
/// control values vary across the designspace
///
/// Each variation carries one-dimensional deltas, one per control value; a
/// `None` delta leaves the corresponding value untouched.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct cvar {
    pub variations: Vec<TupleVariation>,
}
