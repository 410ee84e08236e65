//! Instancing of the axis-description tables: `avar`, `fvar`, `STAT`, plus
//! name-record pruning and the static-font class fields derived from pinned
//! axes.

use super::limits::{normalize_axis_limits, UserAxisLimits};
use crate::error::Result;
use crate::font::{Font, Table};
use crate::otvar::Location;
use crate::tables::avar::SegmentMap;
use crate::tag;
use crate::types::{round_even, F2DOT14, Tag};
use std::collections::{BTreeMap, BTreeSet};

/// Rewrite the `avar` table for the new design space.
///
/// Maps for pinned axes are dropped (the whole table when every axis is
/// pinned). Maps for range-limited axes are rebased onto the new endpoints,
/// dropping entries outside the new range and re-anchoring at `(-1,-1)` and
/// `(1,1)`. A malformed map is kept unchanged with a warning.
pub fn instantiate_avar(font: &mut Font, axis_limits: &UserAxisLimits) -> Result<()> {
    let (location, _) = axis_limits.split_up();

    let axis_tags = match font.fvar() {
        Some(fvar) => fvar.axis_tags(),
        None => return Ok(()),
    };
    if axis_tags.iter().all(|tag| location.contains_key(tag)) {
        log::info!("Dropping avar table");
        font.remove(tag!("avar"));
        return Ok(());
    }

    // Ranges are normalized against the identity mapping here: the avar
    // table's own mappings are what is being rewritten.
    let (_, normalized_ranges) = normalize_axis_limits(font, axis_limits, false)?.split_up();

    let avar = match font.remove(tag!("avar")) {
        Some(Table::Avar(avar)) => avar,
        _ => return Ok(()),
    };
    log::info!("Instantiating avar table");

    let mut segments: BTreeMap<Tag, SegmentMap> = axis_tags
        .iter()
        .copied()
        .zip(avar.maps.into_iter())
        .collect();
    let remaining_tags: Vec<Tag> = axis_tags
        .iter()
        .filter(|tag| !location.contains_key(tag))
        .copied()
        .collect();
    segments.retain(|tag, _| !location.contains_key(tag));

    let mut new_segments: BTreeMap<Tag, SegmentMap> = BTreeMap::new();
    for (axis_tag, segment) in segments {
        if !segment.is_valid() {
            log::warn!(
                "Invalid avar SegmentMap record for axis '{}': missing anchors or non-monotonic; left unchanged",
                axis_tag
            );
            new_segments.insert(axis_tag, segment);
            continue;
        }
        let axis_range = match normalized_ranges.get(&axis_tag) {
            Some(range) if !segment.0.is_empty() => *range,
            _ => {
                new_segments.insert(axis_tag, segment);
                continue;
            }
        };
        let mapped_min = F2DOT14::quantize(segment.piecewise_linear_map(axis_range.minimum()));
        let mapped_max = F2DOT14::quantize(segment.piecewise_linear_map(axis_range.maximum()));
        // Rebase each (from, to) pair by the new endpoints, keyed on the
        // packed from-coordinate so later entries win like a map rebuild.
        let mut new_mapping: BTreeMap<i16, f32> = BTreeMap::new();
        for &(from, to) in &segment.0 {
            let mut from = from;
            let mut to = to;
            if from < 0.0 {
                if axis_range.minimum() == 0.0 || from < axis_range.minimum() {
                    continue;
                }
                from /= axis_range.minimum().abs();
            } else if from > 0.0 {
                if axis_range.maximum() == 0.0 || from > axis_range.maximum() {
                    continue;
                }
                from /= axis_range.maximum();
            }
            if to < 0.0 {
                if mapped_min != 0.0 {
                    to /= mapped_min.abs();
                }
            } else if to > 0.0 && mapped_max != 0.0 {
                to /= mapped_max;
            }
            new_mapping.insert(F2DOT14::pack(from), F2DOT14::quantize(to));
        }
        new_mapping.insert(F2DOT14::pack(-1.0), -1.0);
        new_mapping.insert(F2DOT14::pack(1.0), 1.0);
        new_segments.insert(
            axis_tag,
            SegmentMap(
                new_mapping
                    .into_iter()
                    .map(|(from, to)| (F2DOT14::unpack(from), to))
                    .collect(),
            ),
        );
    }

    font.insert(
        tag!("avar"),
        Table::Avar(crate::tables::avar::avar {
            maps: remaining_tags
                .iter()
                .map(|tag| new_segments.remove(tag).unwrap_or_default())
                .collect(),
        }),
    );
    Ok(())
}

fn is_instance_within_axis_ranges(
    instance_location: &Location,
    axis_ranges: &BTreeMap<Tag, super::limits::AxisRange>,
) -> bool {
    for (tag, coord) in instance_location {
        if let Some(range) = axis_ranges.get(tag) {
            if *coord < range.minimum() || *coord > range.maximum() {
                return false;
            }
        }
    }
    true
}

/// Rewrite the `fvar` table: drop pinned axes, narrow ranged ones, and keep
/// only the named instances still reachable in the new design space.
pub fn instantiate_fvar(font: &mut Font, axis_limits: &UserAxisLimits) {
    let (location, axis_ranges) = axis_limits.split_up();

    let fvar = match font.fvar() {
        Some(fvar) => fvar,
        None => return,
    };
    if fvar
        .axes
        .iter()
        .all(|axis| location.contains_key(&axis.axisTag))
    {
        log::info!("Dropping fvar table");
        font.remove(tag!("fvar"));
        return;
    }

    log::info!("Instantiating fvar table");
    let original_tags = fvar.axis_tags();
    let fvar = font.fvar_mut().unwrap();

    let mut new_axes = vec![];
    for axis in fvar.axes.iter_mut() {
        if location.contains_key(&axis.axisTag) {
            continue;
        }
        if let Some(range) = axis_ranges.get(&axis.axisTag) {
            axis.minValue = range.minimum();
            axis.maxValue = range.maximum();
        }
        new_axes.push(axis.clone());
    }

    let mut new_instances = vec![];
    for instance in &fvar.instances {
        let mut instance_location: Location = original_tags
            .iter()
            .copied()
            .zip(instance.coordinates.iter().copied())
            .collect();

        // only keep named instances whose coordinates match the pinned
        // location exactly
        let mut keep = true;
        for (tag, value) in &location {
            let at_pin = instance_location
                .get(tag)
                .map_or(false, |coord| (coord - value).abs() <= f32::EPSILON);
            if at_pin {
                instance_location.remove(tag);
            } else {
                keep = false;
                break;
            }
        }
        if !keep || !is_instance_within_axis_ranges(&instance_location, &axis_ranges) {
            continue;
        }
        let mut instance = instance.clone();
        instance.coordinates = new_axes
            .iter()
            .map(|axis| instance_location[&axis.axisTag])
            .collect();
        new_instances.push(instance);
    }

    fvar.axes = new_axes;
    fvar.instances = new_instances;
}

/// Filter the STAT axis values against the new limits.
///
/// A value on a pinned axis survives only when it names exactly the pinned
/// coordinate; one on a ranged axis only when it falls inside the range. A
/// format-4 value is dropped as soon as any of its sub-entries fails.
pub fn instantiate_stat(font: &mut Font, axis_limits: &UserAxisLimits) {
    let stat = match font.stat_mut() {
        Some(stat) => stat,
        None => return,
    };
    if stat.design_axes.is_empty() || stat.axis_values.is_empty() {
        // nothing to do
        return;
    }
    log::info!("Instantiating STAT table");

    let (location, axis_ranges) = axis_limits.split_up();
    let design_axes = stat.design_axes.clone();

    let axis_value_outside_limits = |axis_index: Option<u16>, value: f32| -> bool {
        let axis_tag = match axis_index.and_then(|ix| design_axes.get(ix as usize)) {
            Some(axis) => axis.axisTag,
            None => return false,
        };
        if let Some(pinned) = location.get(&axis_tag) {
            if (value - pinned).abs() > f32::EPSILON {
                return true;
            }
        }
        if let Some(range) = axis_ranges.get(&axis_tag) {
            if value < range.minimum() || value > range.maximum() {
                return true;
            }
        }
        false
    };

    let mut new_axis_values = vec![];
    for axis_value in stat.axis_values.clone() {
        match axis_value.format {
            1 | 2 | 3 => {
                let value = if axis_value.format == 2 {
                    axis_value.nominal_value
                } else {
                    axis_value.value
                };
                if let Some(value) = value {
                    if axis_value_outside_limits(axis_value.axis_index, value) {
                        continue;
                    }
                }
            }
            4 => {
                // drop the 'non-analytic' value if any sub-entry misses
                let locations = axis_value.locations.clone().unwrap_or_default();
                if locations
                    .iter()
                    .any(|(&axis_index, &value)| axis_value_outside_limits(Some(axis_index), value))
                {
                    continue;
                }
            }
            other => {
                log::warn!("Unknown STAT AxisValue table format ({}); ignored", other);
            }
        }
        new_axis_values.push(axis_value);
    }
    stat.axis_values = new_axis_values;
}

/// The name IDs referenced by the variation-description tables (fvar and
/// STAT). IDs at or below 255 are reserved by the format and never touched.
pub fn variation_name_ids(font: &Font) -> BTreeSet<u16> {
    let mut used = BTreeSet::new();
    if let Some(fvar) = font.fvar() {
        for axis in &fvar.axes {
            used.insert(axis.axisNameID);
        }
        for instance in &fvar.instances {
            used.insert(instance.subfamilyNameID);
            if let Some(ps_name_id) = instance.postscriptNameID {
                if ps_name_id != 0xFFFF {
                    used.insert(ps_name_id);
                }
            }
        }
    }
    if let Some(stat) = font.stat() {
        for axis in &stat.design_axes {
            used.insert(axis.axisNameID);
        }
        for value in &stat.axis_values {
            used.insert(value.name_id);
        }
    }
    used.into_iter().filter(|&id| id > 255).collect()
}

/// Delete name records that were referenced by the variation tables before
/// instancing and no longer are.
///
/// Also drops the whole `ltag` table when no language-tagged Unicode name
/// records remain; individual ltag entries are never pruned.
pub fn prune_unused_names(font: &mut Font, original_name_ids: BTreeSet<u16>) {
    log::info!("Pruning name table");
    let exclude: BTreeSet<u16> = original_name_ids
        .difference(&variation_name_ids(font))
        .copied()
        .collect();
    if let Some(name) = font.name_mut() {
        name.records.retain(|record| !exclude.contains(&record.nameID));
    }
    if font.contains(tag!("ltag")) {
        let any_language_tagged = font.name().map_or(false, |name| {
            name.records
                .iter()
                .any(|record| record.platformID == 0 && record.languageID != 0xFFFF)
        });
        if !any_language_tagged {
            font.remove(tag!("ltag"));
        }
    }
}

/// Set the OS/2 weight and width classes, and the post italic angle, from
/// pinned `wght`/`wdth`/`slnt` coordinates.
pub fn set_default_weight_width_slant(font: &mut Font, axis_limits: &UserAxisLimits) {
    let (location, _) = axis_limits.split_up();

    if let Some(&wght) = location.get(&tag!("wght")) {
        if let Some(os2) = font.os2_mut() {
            os2.usWeightClass = round_even(wght.max(1.0).min(1000.0)) as u16;
        }
    }
    if let Some(&wdth) = location.get(&tag!("wdth")) {
        if let Some(os2) = font.os2_mut() {
            os2.usWidthClass = width_class_for_percent(wdth);
        }
    }
    if let Some(&slnt) = location.get(&tag!("slnt")) {
        if let Some(post) = font.post_mut() {
            post.italicAngle = slnt.max(-90.0).min(90.0);
        }
    }
}

/// The usWidthClass whose canonical percentage is nearest the given `wdth`
/// coordinate.
fn width_class_for_percent(percent: f32) -> u16 {
    const WIDTH_CLASS_PERCENTS: [f32; 9] =
        [50.0, 62.5, 75.0, 87.5, 100.0, 112.5, 125.0, 150.0, 200.0];
    let mut best = 1;
    let mut best_distance = f32::MAX;
    for (ix, &class_percent) in WIDTH_CLASS_PERCENTS.iter().enumerate() {
        let distance = (percent - class_percent).abs();
        if distance < best_distance {
            best_distance = distance;
            best = ix + 1;
        }
    }
    best as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instancer::limits::{AxisRange, UserAxisLimit};
    use crate::tables::fvar::{fvar, InstanceRecord, VariationAxisRecord};
    use crate::tables::os2::os2;
    use pretty_assertions::assert_eq;

    fn axis(tag: Tag, min: f32, default: f32, max: f32, name_id: u16) -> VariationAxisRecord {
        VariationAxisRecord {
            axisTag: tag,
            minValue: min,
            defaultValue: default,
            maxValue: max,
            flags: 0,
            axisNameID: name_id,
        }
    }

    fn two_axis_font() -> Font {
        let mut font = Font::new();
        font.insert(
            tag!("fvar"),
            Table::Fvar(fvar {
                axes: vec![
                    axis(tag!("wght"), 100.0, 400.0, 900.0, 256),
                    axis(tag!("wdth"), 50.0, 100.0, 150.0, 257),
                ],
                instances: vec![
                    InstanceRecord {
                        subfamilyNameID: 258,
                        flags: 0,
                        coordinates: vec![400.0, 100.0],
                        postscriptNameID: None,
                    },
                    InstanceRecord {
                        subfamilyNameID: 259,
                        flags: 0,
                        coordinates: vec![700.0, 100.0],
                        postscriptNameID: None,
                    },
                ],
            }),
        );
        font
    }

    fn limits(entries: &[(Tag, UserAxisLimit)]) -> UserAxisLimits {
        UserAxisLimits(entries.iter().cloned().collect())
    }

    #[test]
    fn test_fvar_pin_drops_axis_and_filters_instances() {
        let mut font = two_axis_font();
        font.insert(tag!("OS/2"), Table::Os2(os2::default()));
        let limits = limits(&[(tag!("wght"), UserAxisLimit::Pin(700.0))]);
        instantiate_fvar(&mut font, &limits);
        let fvar = font.fvar().unwrap();
        assert_eq!(fvar.axes.len(), 1);
        assert_eq!(fvar.axes[0].axisTag, tag!("wdth"));
        // only the instance pinned at wght=700 survives, with wght stripped
        assert_eq!(fvar.instances.len(), 1);
        assert_eq!(fvar.instances[0].subfamilyNameID, 259);
        assert_eq!(fvar.instances[0].coordinates, vec![100.0]);
    }

    #[test]
    fn test_fvar_range_narrows_axis() {
        let mut font = two_axis_font();
        let limits = limits(&[(
            tag!("wght"),
            UserAxisLimit::Range(AxisRange::new(300.0, 600.0).unwrap()),
        )]);
        instantiate_fvar(&mut font, &limits);
        let fvar = font.fvar().unwrap();
        assert_eq!(fvar.axes[0].minValue, 300.0);
        assert_eq!(fvar.axes[0].maxValue, 600.0);
        // the wght=700 instance falls outside the narrowed range
        assert_eq!(fvar.instances.len(), 1);
        assert_eq!(fvar.instances[0].subfamilyNameID, 258);
    }

    #[test]
    fn test_fvar_full_pin_drops_table() {
        let mut font = two_axis_font();
        let limits = limits(&[
            (tag!("wght"), UserAxisLimit::Pin(700.0)),
            (tag!("wdth"), UserAxisLimit::Pin(100.0)),
        ]);
        instantiate_fvar(&mut font, &limits);
        assert!(!font.contains(tag!("fvar")));
    }

    #[test]
    fn test_width_class() {
        assert_eq!(width_class_for_percent(100.0), 5);
        assert_eq!(width_class_for_percent(50.0), 1);
        assert_eq!(width_class_for_percent(67.5), 2);
        assert_eq!(width_class_for_percent(500.0), 9);
    }

    #[test]
    fn test_set_weight_class() {
        let mut font = two_axis_font();
        font.insert(tag!("OS/2"), Table::Os2(os2::default()));
        let limits = limits(&[(tag!("wght"), UserAxisLimit::Pin(700.0))]);
        set_default_weight_width_slant(&mut font, &limits);
        assert_eq!(font.os2().unwrap().usWeightClass, 700);
    }
}
