//! Pinning and range-limiting of tuple variations.
//!
//! This is where the actual design-space surgery happens: every tuple
//! variation's tents are re-expressed in the coordinate system of the new,
//! smaller design space, with deltas rescaled (and occasionally split in
//! two) so that every location still reachable interpolates exactly as it
//! did before.

use super::limits::{NormalizedAxisLimits, NormalizedAxisRange};
use crate::otvar::{support_scalar, Delta, Location, Support, TupleVariation};
use crate::types::{F2DOT14, Tag};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Instantiate a list of tuple variations at the given location, or limit
/// axes' min/max.
///
/// Variations with no influence within the new design space are dropped;
/// those only partially instanced are kept with scaled deltas; one variation
/// may split in two when a range cuts through its tent. Variations whose
/// tents coincide after the transformation are merged, summing deltas in
/// first-occurrence order.
///
/// For outline stores, pass the default outline and contour end-points so
/// that elided deltas can be inferred before merging.
///
/// Returns the deltas of the variation all of whose axes were pinned (empty
/// if there is none): the caller folds these into the default instance.
pub fn instantiate_tuple_variation_store(
    variations: &mut Vec<TupleVariation>,
    axis_limits: &NormalizedAxisLimits,
    orig_coords: Option<&[(i16, i16)]>,
    end_pts: Option<&[usize]>,
) -> Vec<Option<Delta>> {
    let (pinned_location, axis_ranges) = axis_limits.split_up();

    let mut new_variations = std::mem::take(variations);
    if !pinned_location.is_empty() {
        new_variations = pin_tuple_variation_axes(new_variations, &pinned_location);
    }
    if !axis_ranges.is_empty() {
        new_variations = limit_tuple_variation_axis_ranges(new_variations, &axis_ranges);
    }

    let mut merged: IndexMap<Vec<(Tag, i16, i16, i16)>, TupleVariation> = IndexMap::new();
    for mut var in new_variations {
        // compute inferred deltas only for gvar ('orig_coords' is None for
        // cvar and the item-variation-store adapter)
        if let Some(coords) = orig_coords {
            var.calc_inferred_deltas(coords, end_pts.unwrap_or(&[]));
        }
        let key = var.axes_key();
        match merged.get_mut(&key) {
            Some(existing) => existing.add_deltas(&var),
            None => {
                merged.insert(key, var);
            }
        }
    }

    // the variation with no axes left is fully instanced; its deltas belong
    // to the default instance
    let default_key: Vec<(Tag, i16, i16, i16)> = vec![];
    let default_deltas = merged
        .shift_remove(&default_key)
        .map(|var| var.deltas)
        .unwrap_or_default();

    for var in merged.values_mut() {
        var.round_deltas();
    }
    *variations = merged.into_values().collect();

    default_deltas
}

/// Pin some axes, scaling every variation by its support at the pinned
/// location and removing the pinned axes from its tent mapping.
pub fn pin_tuple_variation_axes(
    variations: Vec<TupleVariation>,
    location: &Location,
) -> Vec<TupleVariation> {
    let mut new_variations = vec![];
    for mut var in variations {
        // A TupleVariation not mentioning an axis means the axis peak is 0,
        // i.e. the axis does not participate.
        let mut support = Support::new();
        for axis in location.keys() {
            support.insert(
                *axis,
                var.axes.remove(axis).unwrap_or((-1.0, 0.0, 1.0)),
            );
        }
        let scalar = support_scalar(location, &support);
        if scalar == 0.0 {
            // no influence at this location, drop the variation
            continue;
        }
        var.scale_deltas(scalar);
        new_variations.push(var);
    }
    new_variations
}

/// Limit some axes to new ranges, axis by axis in tag order.
pub fn limit_tuple_variation_axis_ranges(
    variations: Vec<TupleVariation>,
    axis_ranges: &BTreeMap<Tag, NormalizedAxisRange>,
) -> Vec<TupleVariation> {
    let mut variations = variations;
    for (&axis_tag, &axis_range) in axis_ranges.iter() {
        let mut new_variations = vec![];
        for var in variations {
            new_variations.extend(limit_tuple_variation_axis_range(var, axis_tag, axis_range));
        }
        variations = new_variations;
    }
    variations
}

fn quantized(lower: f32, peak: f32, upper: f32) -> (f32, f32, f32) {
    (
        F2DOT14::quantize(lower),
        F2DOT14::quantize(peak),
        F2DOT14::quantize(upper),
    )
}

/// Limit one variation's tent along one axis, yielding zero, one or two
/// variations.
pub fn limit_tuple_variation_axis_range(
    mut var: TupleVariation,
    axis_tag: Tag,
    axis_range: NormalizedAxisRange,
) -> Vec<TupleVariation> {
    // skip when the axis doesn't participate, or when the tent isn't fully
    // on either the negative or positive side
    let (lower, peak, upper) = var.tent(axis_tag).unwrap_or((-1.0, 0.0, 1.0));
    if peak == 0.0 || lower > peak || peak > upper || (lower < 0.0 && upper > 0.0) {
        return vec![var];
    }

    let negative = lower < 0.0;
    if negative {
        if axis_range.minimum() == -1.0 {
            return vec![var];
        } else if axis_range.minimum() == 0.0 {
            return vec![];
        }
    } else if axis_range.maximum() == 1.0 {
        return vec![var];
    } else if axis_range.maximum() == 0.0 {
        return vec![];
    }

    let limit = if negative {
        axis_range.minimum()
    } else {
        axis_range.maximum()
    };

    // Rebase the tent onto the new limit, which becomes the new -1 or +1.
    // The rebased values are always positive, because dividend and divisor
    // are either both positive or both negative.
    let mut new_lower = lower / limit;
    let mut new_peak = peak / limit;
    let mut new_upper = upper / limit;
    // for a negative-side tent, swap lower and upper to share the
    // positive-side logic below
    if negative {
        std::mem::swap(&mut new_lower, &mut new_upper);
    }

    let original_scalar_at_limit = || {
        let mut loc = Location::new();
        loc.insert(axis_tag, limit);
        let mut support = Support::new();
        support.insert(axis_tag, (lower, peak, upper));
        support_scalar(&loc, &support)
    };

    if new_lower == 1.0 && new_peak == 1.0 {
        // innermost bound == peak == limit: collapse to a pinned tent
        let tent = if negative {
            (-1.0, -1.0, -1.0)
        } else {
            (1.0, 1.0, 1.0)
        };
        var.axes.insert(axis_tag, tent);
        vec![var]
    } else if new_lower >= 1.0 {
        // the whole tent falls outside the new limit
        vec![]
    } else if new_peak >= 1.0 {
        // the peak escapes the new range but some influence remains: scale
        // deltas by the support at the new limit and clamp the tent
        var.scale_deltas(original_scalar_at_limit());
        new_peak = 1.0;
        new_upper = 1.0;
        let tent = if negative {
            (-new_upper, -new_peak, -new_lower)
        } else {
            (new_lower, new_peak, new_upper)
        };
        var.axes.insert(axis_tag, quantized(tent.0, tent.1, tent.2));
        vec![var]
    } else if new_upper <= 2.0 {
        // the peak stays inside; the tail beyond +1 is never applied, as
        // renderers clamp to the -1..=1 box, so the bounds can simply be
        // rewritten
        let tent = if negative {
            (-new_upper, -new_peak, -new_lower)
        } else {
            (
                new_lower,
                new_peak,
                if new_upper > F2DOT14::MAX {
                    F2DOT14::MAX
                } else {
                    new_upper
                },
            )
        };
        var.axes.insert(axis_tag, quantized(tent.0, tent.1, tent.2));
        vec![var]
    } else {
        // the tail is too long even for the 2.14 headroom: chop the tent in
        // two, an outer triangle with the original slope and an inner one
        // holding the remainder, so interpolation within the new range is
        // unchanged
        let mut new_var = TupleVariation::new(var.axes.clone(), var.deltas.clone());
        if negative {
            var.axes
                .insert(axis_tag, quantized(-2.0, -new_peak, -new_lower));
            new_var
                .axes
                .insert(axis_tag, quantized(-1.0, -1.0, -new_peak));
        } else {
            var.axes
                .insert(axis_tag, quantized(new_lower, new_peak, F2DOT14::MAX));
            new_var.axes.insert(axis_tag, quantized(new_peak, 1.0, 1.0));
        }
        let scalar1 = original_scalar_at_limit();
        let scalar2 = 1.0 / (2.0 - new_peak);
        new_var.scale_deltas(scalar1 - scalar2);

        vec![var, new_var]
    }
}
