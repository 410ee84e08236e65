//! Instancing of the GSUB/GPOS feature variations.
//!
//! Conditions on pinned axes either kill their record or vanish (being
//! forever satisfied); conditions on range-limited axes are rescaled into
//! the new normalized space; conditions on untouched axes have their axis
//! index rewritten for the reduced axis order. A record left with no
//! conditions applies unconditionally: its substitutions are written into
//! the feature list once, first such record wins.

use super::limits::{NormalizedAxisLimits, NormalizedAxisRange};
use crate::font::{Font, Table};
use crate::otvar::Location;
use crate::tables::fvar::VariationAxisRecord;
use crate::tables::layout::{Condition, FeatureVariationRecord, LayoutTable};
use crate::tag;
use crate::types::Tag;
use std::collections::{BTreeMap, BTreeSet};

pub fn instantiate_feature_variations(font: &mut Font, axis_limits: &NormalizedAxisLimits) {
    let fvar_axes: Vec<VariationAxisRecord> = match font.fvar() {
        Some(fvar) => fvar.axes.clone(),
        None => return,
    };
    for table_tag in [tag!("GPOS"), tag!("GSUB")] {
        let table = match font.tables.get_mut(&table_tag) {
            Some(Table::Gpos(table)) | Some(Table::Gsub(table)) => table,
            _ => continue,
        };
        if table.feature_variations.is_none() {
            continue;
        }
        log::info!("Instantiating FeatureVariations of {} table", table_tag);
        instantiate_table_feature_variations(table, &fvar_axes, axis_limits);
        // remove unreferenced lookups
        table.prune_lookups();
    }
}

/// Outcome of the pin pass over one record's condition set.
enum PinOutcome {
    /// Every condition was on a pinned axis and satisfied.
    Applies,
    /// A condition on a pinned axis failed; the record is dead.
    Dead,
    /// Some conditions remain.
    Keep(Vec<Condition>),
}

fn pin_feature_variation_record(
    record: &FeatureVariationRecord,
    record_index: usize,
    location: &Location,
    fvar_axes: &[VariationAxisRecord],
) -> PinOutcome {
    let mut applies = true;
    let mut new_conditions = vec![];
    for (i, condition) in record.condition_set.iter().enumerate() {
        match condition {
            Condition::Format1 {
                axis_index,
                filter_range_min_value,
                filter_range_max_value,
            } => {
                let axis_tag = fvar_axes[*axis_index as usize].axisTag;
                if let Some(v) = location.get(&axis_tag) {
                    if !(filter_range_min_value <= v && v <= filter_range_max_value) {
                        // condition not met, remove the entire record
                        return PinOutcome::Dead;
                    }
                    // condition satisfied for good; drop it
                } else {
                    applies = false;
                    new_conditions.push(condition.clone());
                }
            }
            Condition::Unsupported { format } => {
                log::warn!(
                    "Condition table {} of FeatureVariationRecord {} has unsupported format ({}); ignored",
                    i,
                    record_index,
                    format
                );
                applies = false;
                new_conditions.push(condition.clone());
            }
        }
    }
    if applies {
        PinOutcome::Applies
    } else {
        PinOutcome::Keep(new_conditions)
    }
}

/// Rescale a condition's user range into a new axis range, mirroring the
/// tent-rebasing arithmetic. Returns `None` when the condition can no
/// longer be met.
fn limit_feature_variation_condition_range(
    min_value: f32,
    max_value: f32,
    axis_range: NormalizedAxisRange,
) -> Option<(f32, f32)> {
    if min_value > max_value
        || min_value > axis_range.maximum()
        || max_value < axis_range.minimum()
    {
        // condition invalid or out of range
        return None;
    }
    let rescale = |value: f32| {
        if value < 0.0 {
            if axis_range.minimum() == 0.0 {
                0.0
            } else {
                (value / axis_range.minimum().abs()).max(-1.0)
            }
        } else if value > 0.0 {
            if axis_range.maximum() == 0.0 {
                0.0
            } else {
                (value / axis_range.maximum()).min(1.0)
            }
        } else {
            0.0
        }
    };
    Some((rescale(min_value), rescale(max_value)))
}

/// Apply the range pass to a record's conditions. Returns false when the
/// record cannot be satisfied within the new ranges.
fn limit_feature_variation_record(
    conditions: &mut Vec<Condition>,
    axis_ranges: &BTreeMap<Tag, NormalizedAxisRange>,
    fvar_axes: &[VariationAxisRecord],
) -> bool {
    for condition in conditions.iter_mut() {
        if let Condition::Format1 {
            axis_index,
            filter_range_min_value,
            filter_range_max_value,
        } = condition
        {
            let axis_tag = fvar_axes[*axis_index as usize].axisTag;
            if let Some(&axis_range) = axis_ranges.get(&axis_tag) {
                match limit_feature_variation_condition_range(
                    *filter_range_min_value,
                    *filter_range_max_value,
                    axis_range,
                ) {
                    Some((new_min, new_max)) => {
                        *filter_range_min_value = new_min;
                        *filter_range_max_value = new_max;
                    }
                    None => return false,
                }
            }
        }
    }
    true
}

/// Remap surviving conditions' axis indices to the reduced axis order.
fn remap_condition_axes(
    conditions: &mut Vec<Condition>,
    fvar_axes: &[VariationAxisRecord],
    axis_index_map: &BTreeMap<Tag, u16>,
) {
    for condition in conditions.iter_mut() {
        if let Condition::Format1 { axis_index, .. } = condition {
            let axis_tag = fvar_axes[*axis_index as usize].axisTag;
            if let Some(&new_index) = axis_index_map.get(&axis_tag) {
                *axis_index = new_index;
            }
        }
    }
}

type RecordKey = (u32, BTreeSet<(u16, u32, u32)>);

/// A key identifying a record by its substitution-table version and
/// canonical condition set; `None` when the set contains a condition we
/// cannot canonicalize (such records always count as unique).
fn record_key(record: &FeatureVariationRecord) -> Option<RecordKey> {
    let mut conditions = BTreeSet::new();
    for condition in &record.condition_set {
        match condition {
            Condition::Format1 {
                axis_index,
                filter_range_min_value,
                filter_range_max_value,
            } => {
                conditions.insert((
                    *axis_index,
                    filter_range_min_value.to_bits(),
                    filter_range_max_value.to_bits(),
                ));
            }
            Condition::Unsupported { .. } => return None,
        }
    }
    Some((record.substitution.version, conditions))
}

fn instantiate_table_feature_variations(
    table: &mut LayoutTable,
    fvar_axes: &[VariationAxisRecord],
    axis_limits: &NormalizedAxisLimits,
) {
    let (location, axis_ranges) = axis_limits.split_up();
    let axis_index_map: BTreeMap<Tag, u16> = fvar_axes
        .iter()
        .filter(|axis| !location.contains_key(&axis.axisTag))
        .enumerate()
        .map(|(new_index, axis)| (axis.axisTag, new_index as u16))
        .collect();

    let records = table.feature_variations.take().unwrap_or_default();
    let mut feature_variation_applied = false;
    let mut unique_records: BTreeSet<RecordKey> = BTreeSet::new();
    let mut new_records = vec![];

    for (record_index, record) in records.into_iter().enumerate() {
        let (applies, mut conditions) =
            match pin_feature_variation_record(&record, record_index, &location, fvar_axes) {
                PinOutcome::Dead => continue,
                PinOutcome::Applies => (true, vec![]),
                PinOutcome::Keep(conditions) => (false, conditions),
            };

        let mut should_keep = !conditions.is_empty();
        if should_keep {
            should_keep = limit_feature_variation_record(&mut conditions, &axis_ranges, fvar_axes);
        }
        if should_keep {
            remap_condition_axes(&mut conditions, fvar_axes, &axis_index_map);
            let new_record = FeatureVariationRecord {
                condition_set: conditions,
                substitution: record.substitution.clone(),
            };
            let is_unique = match record_key(&new_record) {
                Some(key) => unique_records.insert(key),
                // can't tell whether this duplicates another, assume unique
                None => true,
            };
            if is_unique {
                new_records.push(new_record);
            }
        }

        if applies && !feature_variation_applied {
            if record.substitution.version == 0x00010000 {
                for (feature_index, feature) in &record.substitution.substitutions {
                    if let Some(feature_record) = table.features.get_mut(*feature_index as usize) {
                        feature_record.feature = feature.clone();
                    }
                }
                // set variations only once
                feature_variation_applied = true;
            } else {
                log::warn!(
                    "FeatureVariationRecord {} has unsupported substitution version 0x{:08X}; not applied",
                    record_index,
                    record.substitution.version
                );
            }
        }
    }

    if !new_records.is_empty() {
        table.feature_variations = Some(new_records);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instancer::limits::NormalizedAxisLimit;
    use crate::tables::fvar::fvar;
    use crate::tables::layout::{
        FeatureRecord, FeatureTable, FeatureTableSubstitution, Lookup, LookupSubtable,
    };
    use pretty_assertions::assert_eq;

    fn one_axis_font(table: LayoutTable) -> Font {
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
        font.insert(tag!("GSUB"), Table::Gsub(table));
        font
    }

    /// A GSUB with a `rvrn`-style feature variation active for wght above
    /// 600 user units (0.4 normalized), swapping in lookup 1.
    fn gsub_with_variation() -> LayoutTable {
        let mut single = BTreeMap::new();
        single.insert("dollar".to_string(), "dollar.rvrn".to_string());
        LayoutTable {
            features: vec![FeatureRecord {
                featureTag: tag!("rvrn"),
                feature: FeatureTable { lookup_indices: vec![0] },
            }],
            lookups: vec![
                Lookup { lookup_type: 1, flags: 0, subtables: vec![] },
                Lookup {
                    lookup_type: 1,
                    flags: 0,
                    subtables: vec![LookupSubtable::SingleSubst(single)],
                },
            ],
            feature_variations: Some(vec![FeatureVariationRecord {
                condition_set: vec![Condition::Format1 {
                    axis_index: 0,
                    filter_range_min_value: 0.4,
                    filter_range_max_value: 1.0,
                }],
                substitution: FeatureTableSubstitution {
                    version: 0x00010000,
                    substitutions: vec![(0, FeatureTable { lookup_indices: vec![1] })],
                },
            }]),
        }
    }

    fn pin(value: f32) -> NormalizedAxisLimits {
        let mut limits = BTreeMap::new();
        limits.insert(tag!("wght"), NormalizedAxisLimit::Pin(value));
        NormalizedAxisLimits(limits)
    }

    #[test]
    fn test_pin_inside_condition_applies_once() {
        let mut font = one_axis_font(gsub_with_variation());
        instantiate_feature_variations(&mut font, &pin(0.6));
        let gsub = font.gsub().unwrap();
        // the substitution was applied to the feature list and the record
        // dropped
        assert_eq!(gsub.feature_variations, None);
        assert_eq!(gsub.features[0].feature.lookup_indices, vec![0]);
        match &gsub.lookups[0].subtables[0] {
            LookupSubtable::SingleSubst(map) => {
                assert_eq!(map["dollar"], "dollar.rvrn".to_string());
            }
            _ => panic!("substitution lookup not retained"),
        }
        // the now-unreferenced original lookup was pruned
        assert_eq!(gsub.lookups.len(), 1);
    }

    #[test]
    fn test_pin_outside_condition_drops_record() {
        let mut font = one_axis_font(gsub_with_variation());
        instantiate_feature_variations(&mut font, &pin(0.2));
        let gsub = font.gsub().unwrap();
        assert_eq!(gsub.feature_variations, None);
        // nothing applied: the default feature still points at lookup 0,
        // and the alternate lookup is gone
        assert_eq!(gsub.features[0].feature.lookup_indices, vec![0]);
        assert_eq!(gsub.lookups.len(), 1);
        match &gsub.lookups[0].subtables[..] {
            [] => {}
            _ => panic!("expected the empty default lookup"),
        }
    }

    #[test]
    fn test_range_rescales_condition() {
        let mut font = one_axis_font(gsub_with_variation());
        let mut limits = BTreeMap::new();
        limits.insert(
            tag!("wght"),
            NormalizedAxisLimit::Range(NormalizedAxisRange::new(0.0, 0.5).unwrap()),
        );
        instantiate_feature_variations(&mut font, &NormalizedAxisLimits(limits));
        let gsub = font.gsub().unwrap();
        let records = gsub.feature_variations.as_ref().unwrap();
        assert_eq!(records.len(), 1);
        match &records[0].condition_set[..] {
            [Condition::Format1 {
                axis_index,
                filter_range_min_value,
                filter_range_max_value,
            }] => {
                assert_eq!(*axis_index, 0);
                // 0.4 rebased onto the new 0.5 maximum
                assert!((filter_range_min_value - 0.8).abs() < 1e-6);
                assert!((filter_range_max_value - 1.0).abs() < 1e-6);
            }
            other => panic!("unexpected conditions: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_records_dedup() {
        let mut table = gsub_with_variation();
        let record = table.feature_variations.as_ref().unwrap()[0].clone();
        table.feature_variations.as_mut().unwrap().push(record);
        let mut font = one_axis_font(table);
        let mut limits = BTreeMap::new();
        limits.insert(
            tag!("wght"),
            NormalizedAxisLimit::Range(NormalizedAxisRange::new(-1.0, 1.0).unwrap()),
        );
        instantiate_feature_variations(&mut font, &NormalizedAxisLimits(limits));
        let gsub = font.gsub().unwrap();
        assert_eq!(gsub.feature_variations.as_ref().unwrap().len(), 1);
    }
}
