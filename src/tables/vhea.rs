/// Represents a font's vhea (Vertical Header) table
///
/// Only the fields the metrics-variation (`MVAR`) table can address are
/// modelled.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct vhea {
    pub vertTypoAscender: i16,
    pub vertTypoDescender: i16,
    pub vertTypoLineGap: i16,
    pub caretSlopeRise: i16,
    pub caretSlopeRun: i16,
    pub caretOffset: i16,
}
