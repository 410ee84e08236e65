use crate::otvar::TupleVariation;
use indexmap::IndexMap;

/// Represents a font's gvar (Glyph Variations) table, describing how glyph
/// outlines vary across the designspace
///
/// Keyed by glyph name; a glyph with no variations has no entry. Each
/// variation's deltas run over the glyph's points plus the four phantom
/// points, with `None` for deltas elided by the IUP encoding.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct gvar {
    pub variations: IndexMap<String, Vec<TupleVariation>>,
}
