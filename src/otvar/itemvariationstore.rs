use super::locations::Support;
use crate::types::Tag;
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// The tent of one axis within a variation region
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct RegionAxisCoordinates {
    pub startCoord: f32,
    pub peakCoord: f32,
    pub endCoord: f32,
}

/// Variation data inside an item variation store
///
/// Rows provide sets of deltas for particular target items, and columns
/// correspond to regions of the variation space.
#[derive(Debug, PartialEq, Clone)]
pub struct ItemVariationData {
    /// Indices into the store's region list, one per column.
    pub region_indexes: Vec<u16>,
    /// A two-dimensional (row-major) array of delta values.
    pub delta_values: Vec<Vec<i32>>,
}

impl ItemVariationData {
    /// A subtable with no regions, keeping the given number of (empty) rows
    /// so that VariationIndex references into it stay decodable.
    pub fn empty(item_count: usize) -> Self {
        ItemVariationData {
            region_indexes: vec![],
            delta_values: vec![vec![]; item_count],
        }
    }
}

/// An item variation store: a region list shared by a set of variation data
/// subtables
#[derive(Debug, PartialEq, Clone)]
pub struct ItemVariationStore {
    /// Format - set to 1
    pub format: u16,
    /// The number of variation axes in this font.
    pub axisCount: u16,
    /// The variation regions used in this store.
    pub variationRegions: Vec<Vec<RegionAxisCoordinates>>,
    /// A list of item variation subtables.
    pub variationData: Vec<ItemVariationData>,
}

/// The compound `(subtable << 16) | row` value other tables use to refer to
/// a delta set in an item variation store
pub fn variation_index(major: u16, minor: u16) -> u32 {
    ((major as u32) << 16) | minor as u32
}

impl ItemVariationStore {
    /// The region at `region_index` as an axis-tag-to-tent mapping.
    ///
    /// Every axis appears in the result, including non-participating ones
    /// (whose peak is 0); `axis_order` must list the font's axes in fvar
    /// order.
    pub fn region_support(&self, region_index: usize, axis_order: &[Tag]) -> Support {
        let mut support = Support::new();
        for (tag, coords) in axis_order
            .iter()
            .zip(self.variationRegions[region_index].iter())
        {
            support.insert(*tag, (coords.startCoord, coords.peakCoord, coords.endCoord));
        }
        support
    }

    /// True when the region list is empty, i.e. no variation data remains.
    pub fn is_empty(&self) -> bool {
        self.variationRegions.is_empty()
    }

    /// Remove regions not referenced by any subtable, rewriting the region
    /// indexes of the survivors.
    pub fn prune_regions(&mut self) {
        let mut used = vec![false; self.variationRegions.len()];
        for data in &self.variationData {
            for &r in &data.region_indexes {
                used[r as usize] = true;
            }
        }
        let mut new_index = vec![0u16; self.variationRegions.len()];
        let mut kept = 0u16;
        for (ix, keep) in used.iter().enumerate() {
            if *keep {
                new_index[ix] = kept;
                kept += 1;
            }
        }
        self.variationRegions = self
            .variationRegions
            .iter()
            .zip(used.iter())
            .filter(|(_, keep)| **keep)
            .map(|(region, _)| region.clone())
            .collect();
        for data in self.variationData.iter_mut() {
            for r in data.region_indexes.iter_mut() {
                *r = new_index[*r as usize];
            }
        }
    }

    /// Compact the store, returning a remap of every VariationIndex.
    ///
    /// Columns whose deltas are all zero are dropped, identical delta rows
    /// within a subtable are shared, and unreferenced regions pruned. Every
    /// `(major << 16) | minor` value that was valid before appears as a key
    /// in the returned map.
    pub fn optimize(&mut self) -> BTreeMap<u32, u32> {
        let mut remap = BTreeMap::new();
        for (major, data) in self.variationData.iter_mut().enumerate() {
            let used_columns: Vec<usize> = (0..data.region_indexes.len())
                .filter(|&col| data.delta_values.iter().any(|row| row[col] != 0))
                .collect();
            data.region_indexes = used_columns
                .iter()
                .map(|&col| data.region_indexes[col])
                .collect();
            for row in data.delta_values.iter_mut() {
                *row = used_columns.iter().map(|&col| row[col]).collect();
            }

            let mut unique_rows: IndexMap<Vec<i32>, u16> = IndexMap::new();
            for (minor, row) in data.delta_values.iter().enumerate() {
                let next = unique_rows.len() as u16;
                let new_minor = *unique_rows.entry(row.clone()).or_insert(next);
                remap.insert(
                    variation_index(major as u16, minor as u16),
                    variation_index(major as u16, new_minor),
                );
            }
            data.delta_values = unique_rows.into_keys().collect();
        }
        self.prune_regions();
        remap
    }
}
