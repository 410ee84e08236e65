//! Instancing of item variation stores.
//!
//! The indexed region/delta form used by `MVAR`, `HVAR`, `VVAR` and `GDEF`
//! is translated into a per-subtable tuple-variation view, transformed with
//! the same machinery as `gvar`, and re-indexed back into a compact store.
//! Subtable and row counts are preserved throughout so that VariationIndex
//! values embedded in other tables remain valid.

use super::limits::NormalizedAxisLimits;
use super::tuplevar::instantiate_tuple_variation_store;
use crate::otvar::{
    variation_index, Delta, ItemVariationData, ItemVariationStore, RegionAxisCoordinates, Support,
    TupleVariation,
};
use crate::tables::fvar::VariationAxisRecord;
use crate::types::{F2DOT14, Tag};
use indexmap::IndexMap;
use std::collections::BTreeMap;

fn support_key(support: &Support) -> Vec<(Tag, i16, i16, i16)> {
    support
        .iter()
        .map(|(&tag, &(lower, peak, upper))| {
            (
                tag,
                F2DOT14::pack(lower),
                F2DOT14::pack(peak),
                F2DOT14::pack(upper),
            )
        })
        .collect()
}

/// A tuple-variation view over an item variation store
pub struct TupleVarStoreAdapter {
    regions: Vec<Support>,
    axis_order: Vec<Tag>,
    tuple_var_data: Vec<Vec<TupleVariation>>,
    item_counts: Vec<usize>,
}

impl TupleVarStoreAdapter {
    /// Expand each subtable's row-major delta matrix into one tuple
    /// variation per referenced region.
    pub fn from_item_var_store(
        store: &ItemVariationStore,
        fvar_axes: &[VariationAxisRecord],
    ) -> Self {
        let axis_order: Vec<Tag> = fvar_axes.iter().map(|axis| axis.axisTag).collect();
        let regions: Vec<Support> = (0..store.variationRegions.len())
            .map(|ix| store.region_support(ix, &axis_order))
            .collect();
        let mut tuple_var_data = vec![];
        let mut item_counts = vec![];
        for var_data in &store.variationData {
            let mut variations = vec![];
            for (column, &region_ix) in var_data.region_indexes.iter().enumerate() {
                let deltas: Vec<Option<Delta>> = var_data
                    .delta_values
                    .iter()
                    .map(|row| Some(Delta::Delta1D(row[column] as f32)))
                    .collect();
                variations.push(TupleVariation::new(
                    regions[region_ix as usize].clone(),
                    deltas,
                ));
            }
            tuple_var_data.push(variations);
            item_counts.push(var_data.delta_values.len());
        }
        TupleVarStoreAdapter {
            regions,
            axis_order,
            tuple_var_data,
            item_counts,
        }
    }

    /// Instantiate each subtable's variations independently, returning the
    /// per-subtable default-delta residues (a zero vector where a subtable
    /// produced none, preserving row count).
    pub fn instantiate(&mut self, axis_limits: &NormalizedAxisLimits) -> Vec<Vec<f32>> {
        let mut default_delta_array = vec![];
        for (variations, &item_count) in self.tuple_var_data.iter_mut().zip(self.item_counts.iter())
        {
            let default_deltas = instantiate_tuple_variation_store(variations, axis_limits, None, None);
            if default_deltas.is_empty() {
                default_delta_array.push(vec![0.0; item_count]);
            } else {
                default_delta_array.push(
                    default_deltas
                        .iter()
                        .map(|delta| delta.as_ref().map(Delta::get_1d).unwrap_or(0.0))
                        .collect(),
                );
            }
        }

        // rebuild regions whose axes were dropped or limited
        self.rebuild_regions();

        let pinned = axis_limits.pinned_axes();
        self.axis_order.retain(|tag| !pinned.contains(tag));

        default_delta_array
    }

    /// Collect the ordered set of distinct regions now in use, preserving
    /// the original order for regions that still exist and appending new
    /// ones at the end.
    fn rebuild_regions(&mut self) {
        let mut unique_regions: IndexMap<Vec<(Tag, i16, i16, i16)>, Support> = IndexMap::new();
        for variations in &self.tuple_var_data {
            for var in variations {
                unique_regions
                    .entry(var.axes_key())
                    .or_insert_with(|| var.axes.clone());
            }
        }
        let mut new_regions = vec![];
        for region in &self.regions {
            let key = support_key(region);
            if unique_regions.shift_remove(&key).is_some() {
                new_regions.push(region.clone());
            }
        }
        new_regions.extend(unique_regions.into_values());
        self.regions = new_regions;
    }

    /// Re-index the tuple variations back into compact form.
    pub fn into_item_var_store(self) -> ItemVariationStore {
        let region_order: Vec<Vec<(Tag, i16, i16, i16)>> =
            self.regions.iter().map(support_key).collect();
        let mut variation_data = vec![];
        for (variations, item_count) in self.tuple_var_data.iter().zip(self.item_counts.iter()) {
            if variations.is_empty() {
                variation_data.push(ItemVariationData::empty(*item_count));
                continue;
            }
            assert_eq!(variations[0].deltas.len(), *item_count);
            let region_indexes: Vec<u16> = variations
                .iter()
                .map(|var| {
                    region_order
                        .iter()
                        .position(|key| *key == var.axes_key())
                        .expect("Variation region missing from rebuilt region list")
                        as u16
                })
                .collect();
            let delta_values: Vec<Vec<i32>> = (0..*item_count)
                .map(|item| {
                    variations
                        .iter()
                        .map(|var| {
                            var.deltas[item]
                                .as_ref()
                                .map(|delta| delta.get_1d() as i32)
                                .unwrap_or(0)
                        })
                        .collect()
                })
                .collect();
            variation_data.push(ItemVariationData {
                region_indexes,
                delta_values,
            });
        }
        let variation_regions: Vec<Vec<RegionAxisCoordinates>> = self
            .regions
            .iter()
            .map(|region| {
                self.axis_order
                    .iter()
                    .map(|tag| {
                        let (startCoord, peakCoord, endCoord) =
                            region.get(tag).copied().unwrap_or((0.0, 0.0, 0.0));
                        RegionAxisCoordinates {
                            startCoord,
                            peakCoord,
                            endCoord,
                        }
                    })
                    .collect()
            })
            .collect();
        let mut store = ItemVariationStore {
            format: 1,
            axisCount: self.axis_order.len() as u16,
            variationRegions: variation_regions,
            variationData: variation_data,
        };
        store.prune_regions();
        store
    }
}

/// Compute deltas at the new default location and update the store in
/// place.
///
/// Returns the default-delta residue for every row, keyed by the compound
/// VariationIndex `(subtable << 16) | row`. Subtable count and row counts
/// are unchanged; call [`ItemVariationStore::optimize`] afterwards to
/// compact the store further.
pub fn instantiate_item_variation_store(
    store: &mut ItemVariationStore,
    fvar_axes: &[VariationAxisRecord],
    axis_limits: &NormalizedAxisLimits,
) -> BTreeMap<u32, f32> {
    let mut adapter = TupleVarStoreAdapter::from_item_var_store(store, fvar_axes);
    let default_delta_array = adapter.instantiate(axis_limits);
    let new_store = adapter.into_item_var_store();

    assert_eq!(store.variationData.len(), new_store.variationData.len());
    store.axisCount = new_store.axisCount;
    store.variationRegions = new_store.variationRegions;
    store.variationData = new_store.variationData;

    let mut default_deltas = BTreeMap::new();
    for (major, deltas) in default_delta_array.into_iter().enumerate() {
        for (minor, delta) in deltas.into_iter().enumerate() {
            default_deltas.insert(variation_index(major as u16, minor as u16), delta);
        }
    }
    default_deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instancer::limits::{NormalizedAxisLimit, NormalizedAxisRange};
    use crate::tag;

    fn axis(tag: Tag) -> VariationAxisRecord {
        VariationAxisRecord {
            axisTag: tag,
            minValue: -1.0,
            defaultValue: 0.0,
            maxValue: 1.0,
            flags: 0,
            axisNameID: 256,
        }
    }

    fn region(tents: &[(f32, f32, f32)]) -> Vec<RegionAxisCoordinates> {
        tents
            .iter()
            .map(|&(startCoord, peakCoord, endCoord)| RegionAxisCoordinates {
                startCoord,
                peakCoord,
                endCoord,
            })
            .collect()
    }

    fn two_axis_store() -> (ItemVariationStore, Vec<VariationAxisRecord>) {
        let store = ItemVariationStore {
            format: 1,
            axisCount: 2,
            variationRegions: vec![
                region(&[(0.0, 1.0, 1.0), (0.0, 0.0, 0.0)]),
                region(&[(0.0, 0.0, 0.0), (0.0, 1.0, 1.0)]),
            ],
            variationData: vec![ItemVariationData {
                region_indexes: vec![0, 1],
                delta_values: vec![vec![100, 10], vec![-40, 4]],
            }],
        };
        (store, vec![axis(tag!("wght")), axis(tag!("wdth"))])
    }

    #[test]
    fn test_pin_one_axis() {
        let (mut store, axes) = two_axis_store();
        let mut limits = BTreeMap::new();
        limits.insert(tag!("wght"), NormalizedAxisLimit::Pin(0.5));
        let deltas =
            instantiate_item_variation_store(&mut store, &axes, &NormalizedAxisLimits(limits));

        // one axis left in the region records
        assert_eq!(store.axisCount, 1);
        // the pinned wght contribution (scaled by 0.5) moves onto a region
        // with no remaining participating axis, which applies everywhere in
        // the reduced design space; no residue is produced
        assert!(deltas.values().all(|&d| d == 0.0));
        assert_eq!(store.variationRegions.len(), 2);
        assert_eq!(
            store.variationData[0].delta_values,
            vec![vec![50, 10], vec![-20, 4]]
        );
    }

    #[test]
    fn test_pin_all_axes_leaves_empty_subtables() {
        let (mut store, axes) = two_axis_store();
        let mut limits = BTreeMap::new();
        limits.insert(tag!("wght"), NormalizedAxisLimit::Pin(1.0));
        limits.insert(tag!("wdth"), NormalizedAxisLimit::Pin(-1.0));
        let deltas =
            instantiate_item_variation_store(&mut store, &axes, &NormalizedAxisLimits(limits));
        // wdth tent (0,1,1) has no influence at -1, so only wght contributes
        assert_eq!(deltas[&variation_index(0, 0)], 100.0);
        assert_eq!(deltas[&variation_index(0, 1)], -40.0);
        assert!(store.is_empty());
        // row counts preserved even though everything was folded out
        assert_eq!(store.variationData.len(), 1);
        assert_eq!(store.variationData[0].delta_values.len(), 2);
        assert!(store.variationData[0].region_indexes.is_empty());
    }

    #[test]
    fn test_range_keeps_row_counts() {
        let (mut store, axes) = two_axis_store();
        let mut limits = BTreeMap::new();
        limits.insert(
            tag!("wght"),
            NormalizedAxisLimit::Range(NormalizedAxisRange::new(-0.5, 0.5).unwrap()),
        );
        let deltas =
            instantiate_item_variation_store(&mut store, &axes, &NormalizedAxisLimits(limits));
        // no residue: every delta set keeps a zero default
        assert!(deltas.values().all(|&d| d == 0.0));
        assert_eq!(store.axisCount, 2);
        assert_eq!(store.variationData[0].delta_values.len(), 2);
        // the wght tent (0,1,1) rebased onto the 0.5 limit scales its column
        assert_eq!(
            store.variationData[0].delta_values,
            vec![vec![50, 10], vec![-20, 4]]
        );
    }
}
