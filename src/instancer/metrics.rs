//! Instancing of the metrics variations: `cvar`, `MVAR`, `HVAR` and `VVAR`.

use super::itemvar::instantiate_item_variation_store;
use super::limits::NormalizedAxisLimits;
use super::tuplevar::instantiate_tuple_variation_store;
use crate::font::{Font, Table};
use crate::tables::fvar::VariationAxisRecord;
use crate::tag;
use crate::types::{round_even, Tag};

/// Instance the `cvar` table, folding the default-delta residue into the
/// control values.
pub fn instantiate_cvar(font: &mut Font, axis_limits: &NormalizedAxisLimits) {
    log::info!("Instantiating cvt/cvar tables");

    let mut cvar = match font.remove(tag!("cvar")) {
        Some(Table::Cvar(cvar)) => cvar,
        _ => return,
    };
    let default_deltas =
        instantiate_tuple_variation_store(&mut cvar.variations, axis_limits, None, None);

    if !default_deltas.is_empty() {
        if let Some(cvt) = font.cvt_mut() {
            for (value, delta) in cvt.values.iter_mut().zip(default_deltas.iter()) {
                if let Some(delta) = delta {
                    let delta = round_even(delta.get_1d());
                    if delta != 0 {
                        *value = (*value as i32 + delta) as i16;
                    }
                }
            }
        }
    }

    if !cvar.variations.is_empty() {
        font.insert(tag!("cvar"), Table::Cvar(cvar));
    }
}

/// Instance the `MVAR` table: fold each record's default delta into the
/// field it names, then either re-optimize the store and rewrite the
/// records' VariationIndex values, or drop the table when nothing varies
/// any more.
pub fn instantiate_mvar(font: &mut Font, axis_limits: &NormalizedAxisLimits) {
    log::info!("Instantiating MVAR table");

    let fvar_axes: Vec<VariationAxisRecord> = match font.fvar() {
        Some(fvar) => fvar.axes.clone(),
        None => return,
    };
    let mut mvar = match font.remove(tag!("MVAR")) {
        Some(Table::Mvar(mvar)) => mvar,
        _ => return,
    };

    let default_deltas = instantiate_item_variation_store(&mut mvar.varStore, &fvar_axes, axis_limits);

    for record in &mvar.records {
        if let Some(&delta) = default_deltas.get(&record.varIdx) {
            let delta = round_even(delta);
            if delta != 0 {
                apply_mvar_delta(font, record.valueTag, delta);
            }
        }
    }

    if !mvar.varStore.is_empty() {
        let var_index_mapping = mvar.varStore.optimize();
        for record in mvar.records.iter_mut() {
            if let Some(&new) = var_index_mapping.get(&record.varIdx) {
                record.varIdx = new;
            }
        }
        font.insert(tag!("MVAR"), Table::Mvar(mvar));
    } else {
        log::info!("Dropping MVAR table");
    }
}

fn add_i16(field: &mut i16, delta: i32) {
    *field = (*field as i32 + delta) as i16;
}

fn add_u16(field: &mut u16, delta: i32) {
    *field = (*field as i32 + delta).max(0) as u16;
}

/// Add one metrics delta into the table field the MVAR value tag names.
/// Tags we don't know are skipped.
fn apply_mvar_delta(font: &mut Font, value_tag: Tag, delta: i32) {
    match value_tag.as_bytes() {
        b"hasc" => font.os2_mut().map(|t| add_i16(&mut t.sTypoAscender, delta)),
        b"hdsc" => font.os2_mut().map(|t| add_i16(&mut t.sTypoDescender, delta)),
        b"hlgp" => font.os2_mut().map(|t| add_i16(&mut t.sTypoLineGap, delta)),
        b"hcla" => font.os2_mut().map(|t| add_u16(&mut t.usWinAscent, delta)),
        b"hcld" => font.os2_mut().map(|t| add_u16(&mut t.usWinDescent, delta)),
        b"xhgt" => font.os2_mut().map(|t| add_i16(&mut t.sxHeight, delta)),
        b"cpht" => font.os2_mut().map(|t| add_i16(&mut t.sCapHeight, delta)),
        b"sbxs" => font.os2_mut().map(|t| add_i16(&mut t.ySubscriptXSize, delta)),
        b"sbys" => font.os2_mut().map(|t| add_i16(&mut t.ySubscriptYSize, delta)),
        b"sbxo" => font.os2_mut().map(|t| add_i16(&mut t.ySubscriptXOffset, delta)),
        b"sbyo" => font.os2_mut().map(|t| add_i16(&mut t.ySubscriptYOffset, delta)),
        b"spxs" => font.os2_mut().map(|t| add_i16(&mut t.ySuperscriptXSize, delta)),
        b"spys" => font.os2_mut().map(|t| add_i16(&mut t.ySuperscriptYSize, delta)),
        b"spxo" => font.os2_mut().map(|t| add_i16(&mut t.ySuperscriptXOffset, delta)),
        b"spyo" => font.os2_mut().map(|t| add_i16(&mut t.ySuperscriptYOffset, delta)),
        b"strs" => font.os2_mut().map(|t| add_i16(&mut t.yStrikeoutSize, delta)),
        b"stro" => font.os2_mut().map(|t| add_i16(&mut t.yStrikeoutPosition, delta)),
        b"hcrs" => font.hhea_mut().map(|t| add_i16(&mut t.caretSlopeRise, delta)),
        b"hcrn" => font.hhea_mut().map(|t| add_i16(&mut t.caretSlopeRun, delta)),
        b"hcof" => font.hhea_mut().map(|t| add_i16(&mut t.caretOffset, delta)),
        b"vasc" => font.vhea_mut().map(|t| add_i16(&mut t.vertTypoAscender, delta)),
        b"vdsc" => font.vhea_mut().map(|t| add_i16(&mut t.vertTypoDescender, delta)),
        b"vlgp" => font.vhea_mut().map(|t| add_i16(&mut t.vertTypoLineGap, delta)),
        b"vcrs" => font.vhea_mut().map(|t| add_i16(&mut t.caretSlopeRise, delta)),
        b"vcrn" => font.vhea_mut().map(|t| add_i16(&mut t.caretSlopeRun, delta)),
        b"vcof" => font.vhea_mut().map(|t| add_i16(&mut t.caretOffset, delta)),
        b"unds" => font.post_mut().map(|t| add_i16(&mut t.underlineThickness, delta)),
        b"undo" => font.post_mut().map(|t| add_i16(&mut t.underlinePosition, delta)),
        _ => None,
    };
}

fn all_axes_pinned(font: &Font, axis_limits: &NormalizedAxisLimits) -> bool {
    let pinned = axis_limits.pinned_axes();
    match font.fvar() {
        Some(fvar) => fvar.axes.iter().all(|axis| pinned.contains(&axis.axisTag)),
        None => false,
    }
}

/// Instance the `HVAR` table.
///
/// Advance deltas were already folded into `hmtx` by the outline pass, so a
/// fully-pinned font simply drops the table. Otherwise the store is
/// instanced in place and, when the table uses indirect delta-set index
/// maps, re-optimized with every map rewritten through the remap.
pub fn instantiate_hvar(font: &mut Font, axis_limits: &NormalizedAxisLimits) {
    if all_axes_pinned(font, axis_limits) {
        log::info!("Dropping HVAR table");
        font.remove(tag!("HVAR"));
        return;
    }
    log::info!("Instantiating HVAR table");
    let fvar_axes: Vec<VariationAxisRecord> = match font.fvar() {
        Some(fvar) => fvar.axes.clone(),
        None => return,
    };
    let hvar = match font.hvar_mut() {
        Some(hvar) => hvar,
        None => return,
    };
    // deltas were already applied, so the residue is ignored
    instantiate_item_variation_store(&mut hvar.varStore, &fvar_axes, axis_limits);

    // Only re-optimize when the table already uses an indirect advance map;
    // a direct glyph-id mapping must keep its VariationIndex layout.
    if !hvar.varStore.is_empty() && hvar.advWidthMap.is_some() {
        let var_index_mapping = hvar.varStore.optimize();
        for map in [&mut hvar.advWidthMap, &mut hvar.lsbMap, &mut hvar.rsbMap]
            .into_iter()
            .flatten()
        {
            map.remap(&var_index_mapping);
        }
    }
}

/// Instance the `VVAR` table; see [`instantiate_hvar`].
pub fn instantiate_vvar(font: &mut Font, axis_limits: &NormalizedAxisLimits) {
    if all_axes_pinned(font, axis_limits) {
        log::info!("Dropping VVAR table");
        font.remove(tag!("VVAR"));
        return;
    }
    log::info!("Instantiating VVAR table");
    let fvar_axes: Vec<VariationAxisRecord> = match font.fvar() {
        Some(fvar) => fvar.axes.clone(),
        None => return,
    };
    let vvar = match font.vvar_mut() {
        Some(vvar) => vvar,
        None => return,
    };
    instantiate_item_variation_store(&mut vvar.varStore, &fvar_axes, axis_limits);

    if !vvar.varStore.is_empty() && vvar.advHeightMap.is_some() {
        let var_index_mapping = vvar.varStore.optimize();
        for map in [
            &mut vvar.advHeightMap,
            &mut vvar.tsbMap,
            &mut vvar.bsbMap,
            &mut vvar.vOrgMap,
        ]
        .into_iter()
        .flatten()
        {
            map.remap(&var_index_mapping);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instancer::limits::NormalizedAxisLimit;
    use crate::otvar::{
        Delta, ItemVariationData, ItemVariationStore, RegionAxisCoordinates, Support,
        TupleVariation,
    };
    use crate::tables::cvar::cvar;
    use crate::tables::cvt::cvt;
    use crate::tables::fvar::fvar;
    use crate::tables::hhea::hhea;
    use crate::tables::os2::os2;
    use crate::tables::MVAR::{MvarRecord, MVAR};
    use std::collections::BTreeMap;

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
        font.insert(tag!("OS/2"), Table::Os2(os2::default()));
        font.insert(tag!("hhea"), Table::Hhea(hhea::default()));
        font
    }

    fn pin(value: f32) -> NormalizedAxisLimits {
        let mut limits = BTreeMap::new();
        limits.insert(tag!("wght"), NormalizedAxisLimit::Pin(value));
        NormalizedAxisLimits(limits)
    }

    #[test]
    fn test_cvar_fold() {
        let mut font = one_axis_font();
        font.insert(tag!("cvt "), Table::Cvt(cvt { values: vec![10, 20, 30] }));
        let mut axes = Support::new();
        axes.insert(tag!("wght"), (0.0, 1.0, 1.0));
        font.insert(
            tag!("cvar"),
            Table::Cvar(cvar {
                variations: vec![TupleVariation::new(
                    axes,
                    vec![Some(Delta::Delta1D(8.0)), None, Some(Delta::Delta1D(-4.0))],
                )],
            }),
        );
        instantiate_cvar(&mut font, &pin(0.5));
        assert!(!font.contains(tag!("cvar")));
        assert_eq!(font.cvt().unwrap().values, vec![14, 20, 28]);
    }

    #[test]
    fn test_mvar_full_pin_folds_and_drops() {
        let mut font = one_axis_font();
        let store = ItemVariationStore {
            format: 1,
            axisCount: 1,
            variationRegions: vec![vec![RegionAxisCoordinates {
                startCoord: 0.0,
                peakCoord: 1.0,
                endCoord: 1.0,
            }]],
            variationData: vec![ItemVariationData {
                region_indexes: vec![0],
                delta_values: vec![vec![30], vec![-10]],
            }],
        };
        font.insert(
            tag!("MVAR"),
            Table::Mvar(MVAR {
                records: vec![
                    MvarRecord { valueTag: tag!("hasc"), varIdx: 0 },
                    MvarRecord { valueTag: tag!("hcrs"), varIdx: 1 },
                ],
                varStore: store,
            }),
        );
        instantiate_mvar(&mut font, &pin(0.5));
        assert!(!font.contains(tag!("MVAR")));
        assert_eq!(font.os2().unwrap().sTypoAscender, 15);
        assert_eq!(font.hhea().unwrap().caretSlopeRise, -5);
    }
}
