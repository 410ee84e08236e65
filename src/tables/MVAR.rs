use crate::otvar::ItemVariationStore;
use crate::types::Tag;

/// One metrics-variation record, tying a four-byte value tag (e.g. `hasc`,
/// `unds`) to a delta set in the store
#[derive(Debug, PartialEq, Clone)]
pub struct MvarRecord {
    pub valueTag: Tag,
    pub varIdx: u32,
}

/// Represents a font's MVAR (Metrics Variations) table
#[derive(Debug, PartialEq, Clone)]
pub struct MVAR {
    pub records: Vec<MvarRecord>,
    pub varStore: ItemVariationStore,
}
