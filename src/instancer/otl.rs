//! Instancing of the layout variation data: the GDEF item variation store
//! and every GPOS value record, anchor and GDEF ligature caret that refers
//! into it.

use super::itemvar::instantiate_item_variation_store;
use super::limits::NormalizedAxisLimits;
use crate::font::{Font, Table};
use crate::tables::fvar::VariationAxisRecord;
use crate::tables::layout::{Anchor, LayoutTable, LookupSubtable, ValueRecord};
use crate::tables::GDEF::GDEF;
use crate::tag;
use crate::types::round_even;
use std::collections::BTreeMap;

/// Instance the GDEF variation store and cascade the results through GDEF
/// and GPOS.
///
/// Default-delta residues are folded into the values that referenced them.
/// When regions survive, the store is re-optimized and every embedded
/// VariationIndex rewritten through the remap; when none do, the variation
/// links are erased and GDEF is downgraded (and dropped entirely if nothing
/// else is left in it).
pub fn instantiate_otl(font: &mut Font, axis_limits: &NormalizedAxisLimits) {
    let has_store = font
        .gdef()
        .map_or(false, |gdef| gdef.version >= 0x00010003 && gdef.var_store.is_some());
    if !has_store {
        return;
    }

    if font.contains(tag!("GPOS")) {
        log::info!("Instantiating GDEF and GPOS tables");
    } else {
        log::info!("Instantiating GDEF table");
    }

    let fvar_axes: Vec<VariationAxisRecord> = match font.fvar() {
        Some(fvar) => fvar.axes.clone(),
        None => return,
    };
    let mut gdef = match font.remove(tag!("GDEF")) {
        Some(Table::Gdef(gdef)) => gdef,
        _ => return,
    };
    let mut var_store = gdef.var_store.take().unwrap();

    let default_deltas = instantiate_item_variation_store(&mut var_store, &fvar_axes, axis_limits);
    let delete_variations = var_store.is_empty();

    merge_gdef(&mut gdef, &default_deltas, delete_variations);
    if let Some(gpos) = font.gpos_mut() {
        merge_gpos(gpos, &default_deltas, delete_variations);
    }

    if !delete_variations {
        let var_index_mapping = var_store.optimize();
        remap_gdef(&mut gdef, &var_index_mapping);
        if let Some(gpos) = font.gpos_mut() {
            remap_gpos(gpos, &var_index_mapping);
        }
        gdef.var_store = Some(var_store);
        font.insert(tag!("GDEF"), Table::Gdef(gdef));
    } else {
        // downgrade GDEF to a version without a variation store
        gdef.version = if gdef.mark_glyph_sets.is_some() {
            0x00010002
        } else {
            0x00010000
        };
        if gdef.is_empty() {
            log::info!("Dropping GDEF table");
        } else {
            font.insert(tag!("GDEF"), Table::Gdef(gdef));
        }
    }
}

fn fold_slot(
    value: &mut i16,
    variation: &mut Option<u32>,
    deltas: &BTreeMap<u32, f32>,
    delete_variations: bool,
) {
    if let Some(index) = *variation {
        let delta = round_even(deltas.get(&index).copied().unwrap_or(0.0));
        if delta != 0 {
            *value = (*value as i32 + delta) as i16;
        }
        if delete_variations {
            *variation = None;
        }
    }
}

fn fold_optional_slot(
    value: &mut Option<i16>,
    variation: &mut Option<u32>,
    deltas: &BTreeMap<u32, f32>,
    delete_variations: bool,
) {
    if let Some(index) = *variation {
        let delta = round_even(deltas.get(&index).copied().unwrap_or(0.0));
        if delta != 0 {
            *value = Some(value.unwrap_or(0) + delta as i16);
        }
        if delete_variations {
            *variation = None;
        }
    }
}

fn fold_value_record(
    record: &mut ValueRecord,
    deltas: &BTreeMap<u32, f32>,
    delete_variations: bool,
) {
    fold_optional_slot(&mut record.xPlacement, &mut record.xPlacementVariation, deltas, delete_variations);
    fold_optional_slot(&mut record.yPlacement, &mut record.yPlacementVariation, deltas, delete_variations);
    fold_optional_slot(&mut record.xAdvance, &mut record.xAdvanceVariation, deltas, delete_variations);
    fold_optional_slot(&mut record.yAdvance, &mut record.yAdvanceVariation, deltas, delete_variations);
}

fn fold_anchor(anchor: &mut Anchor, deltas: &BTreeMap<u32, f32>, delete_variations: bool) {
    fold_slot(&mut anchor.xCoordinate, &mut anchor.xVariation, deltas, delete_variations);
    fold_slot(&mut anchor.yCoordinate, &mut anchor.yVariation, deltas, delete_variations);
}

fn merge_gdef(gdef: &mut GDEF, deltas: &BTreeMap<u32, f32>, delete_variations: bool) {
    for carets in gdef.lig_caret_list.values_mut() {
        for caret in carets.iter_mut() {
            fold_slot(&mut caret.coordinate, &mut caret.variation_index, deltas, delete_variations);
        }
    }
}

fn merge_gpos(gpos: &mut LayoutTable, deltas: &BTreeMap<u32, f32>, delete_variations: bool) {
    for lookup in gpos.lookups.iter_mut() {
        for subtable in lookup.subtables.iter_mut() {
            match subtable {
                LookupSubtable::SinglePos(records) => {
                    for record in records.values_mut() {
                        fold_value_record(record, deltas, delete_variations);
                    }
                }
                LookupSubtable::CursivePos(attachments) => {
                    for (entry, exit) in attachments.values_mut() {
                        if let Some(anchor) = entry {
                            fold_anchor(anchor, deltas, delete_variations);
                        }
                        if let Some(anchor) = exit {
                            fold_anchor(anchor, deltas, delete_variations);
                        }
                    }
                }
                LookupSubtable::SingleSubst(_) => {}
            }
        }
    }
}

fn remap_slot(variation: &mut Option<u32>, mapping: &BTreeMap<u32, u32>) {
    if let Some(index) = *variation {
        if let Some(&new) = mapping.get(&index) {
            *variation = Some(new);
        }
    }
}

fn remap_gdef(gdef: &mut GDEF, mapping: &BTreeMap<u32, u32>) {
    for carets in gdef.lig_caret_list.values_mut() {
        for caret in carets.iter_mut() {
            remap_slot(&mut caret.variation_index, mapping);
        }
    }
}

fn remap_gpos(gpos: &mut LayoutTable, mapping: &BTreeMap<u32, u32>) {
    for lookup in gpos.lookups.iter_mut() {
        for subtable in lookup.subtables.iter_mut() {
            match subtable {
                LookupSubtable::SinglePos(records) => {
                    for record in records.values_mut() {
                        remap_slot(&mut record.xPlacementVariation, mapping);
                        remap_slot(&mut record.yPlacementVariation, mapping);
                        remap_slot(&mut record.xAdvanceVariation, mapping);
                        remap_slot(&mut record.yAdvanceVariation, mapping);
                    }
                }
                LookupSubtable::CursivePos(attachments) => {
                    for (entry, exit) in attachments.values_mut() {
                        for anchor in [entry, exit].into_iter().flatten() {
                            remap_slot(&mut anchor.xVariation, mapping);
                            remap_slot(&mut anchor.yVariation, mapping);
                        }
                    }
                }
                LookupSubtable::SingleSubst(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instancer::limits::NormalizedAxisLimit;
    use crate::otvar::{ItemVariationData, ItemVariationStore, RegionAxisCoordinates};
    use crate::tables::fvar::fvar;
    use crate::tables::layout::Lookup;
    use crate::tables::GDEF::CaretValue;

    fn one_axis_font() -> Font {
        let mut font = Font::new();
        font.insert(
            tag!("fvar"),
            Table::Fvar(fvar {
                axes: vec![VariationAxisRecord {
                    axisTag: tag!("wght"),
                    minValue: 100.0,
                    defaultValue: 400.0,
                    maxValue: 900.0,
                    flags: 0,
                    axisNameID: 256,
                }],
                instances: vec![],
            }),
        );
        font
    }

    fn store() -> ItemVariationStore {
        ItemVariationStore {
            format: 1,
            axisCount: 1,
            variationRegions: vec![vec![RegionAxisCoordinates {
                startCoord: 0.0,
                peakCoord: 1.0,
                endCoord: 1.0,
            }]],
            variationData: vec![ItemVariationData {
                region_indexes: vec![0],
                delta_values: vec![vec![16], vec![-6]],
            }],
        }
    }

    #[test]
    fn test_full_pin_folds_and_erases_links() {
        let mut font = one_axis_font();
        let mut gdef = GDEF::default();
        gdef.version = 0x00010003;
        gdef.var_store = Some(store());
        gdef.lig_caret_list.insert(
            "fi".to_string(),
            vec![CaretValue { coordinate: 200, variation_index: Some(0) }],
        );
        font.insert(tag!("GDEF"), Table::Gdef(gdef));

        let mut records = BTreeMap::new();
        records.insert(
            "A".to_string(),
            ValueRecord {
                xAdvance: Some(500),
                xAdvanceVariation: Some(1),
                ..Default::default()
            },
        );
        font.insert(
            tag!("GPOS"),
            Table::Gpos(LayoutTable {
                features: vec![],
                lookups: vec![Lookup {
                    lookup_type: 1,
                    flags: 0,
                    subtables: vec![LookupSubtable::SinglePos(records)],
                }],
                feature_variations: None,
            }),
        );

        let mut limits = BTreeMap::new();
        limits.insert(tag!("wght"), NormalizedAxisLimit::Pin(0.5));
        instantiate_otl(&mut font, &NormalizedAxisLimits(limits));

        // the store died, GDEF had a caret list so it survives downgraded
        let gdef = font.gdef().unwrap();
        assert_eq!(gdef.version, 0x00010000);
        assert!(gdef.var_store.is_none());
        let caret = &gdef.lig_caret_list["fi"][0];
        assert_eq!(caret.coordinate, 208);
        assert_eq!(caret.variation_index, None);

        let gpos = font.gpos().unwrap();
        match &gpos.lookups[0].subtables[0] {
            LookupSubtable::SinglePos(records) => {
                let record = &records["A"];
                assert_eq!(record.xAdvance, Some(497));
                assert_eq!(record.xAdvanceVariation, None);
            }
            _ => panic!("wrong subtable"),
        }
    }
}
