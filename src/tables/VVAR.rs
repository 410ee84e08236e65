use crate::otvar::ItemVariationStore;
use crate::tables::HVAR::DeltaSetIndexMap;

/// Represents a font's VVAR (Vertical Metrics Variations) table
#[derive(Debug, PartialEq, Clone)]
pub struct VVAR {
    pub varStore: ItemVariationStore,
    pub advHeightMap: Option<DeltaSetIndexMap>,
    pub tsbMap: Option<DeltaSetIndexMap>,
    pub bsbMap: Option<DeltaSetIndexMap>,
    pub vOrgMap: Option<DeltaSetIndexMap>,
}
