use crate::otvar::ItemVariationStore;

/// A delta-set index map: one VariationIndex per glyph id
///
/// When absent, advances map to delta sets implicitly by glyph id.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct DeltaSetIndexMap {
    pub mapping: Vec<u32>,
}

impl DeltaSetIndexMap {
    /// Rewrite every entry through a VariationIndex remap.
    pub fn remap(&mut self, var_index_mapping: &std::collections::BTreeMap<u32, u32>) {
        for entry in self.mapping.iter_mut() {
            if let Some(new) = var_index_mapping.get(entry) {
                *entry = *new;
            }
        }
    }
}

/// Represents a font's HVAR (Horizontal Metrics Variations) table
#[derive(Debug, PartialEq, Clone)]
pub struct HVAR {
    pub varStore: ItemVariationStore,
    pub advWidthMap: Option<DeltaSetIndexMap>,
    pub lsbMap: Option<DeltaSetIndexMap>,
    pub rsbMap: Option<DeltaSetIndexMap>,
}
