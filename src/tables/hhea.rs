/// Represents a font's hhea (Horizontal Header) table
///
/// Only the fields the metrics-variation (`MVAR`) table can address are
/// modelled.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct hhea {
    pub ascender: i16,
    pub descender: i16,
    pub lineGap: i16,
    pub caretSlopeRise: i16,
    pub caretSlopeRun: i16,
    pub caretOffset: i16,
}
