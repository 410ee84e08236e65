//! Instancing of the glyph outline variations.

use super::limits::NormalizedAxisLimits;
use super::tuplevar::instantiate_tuple_variation_store;
use crate::font::{Font, Table};
use crate::otvar::iup;
use crate::tables::glyf::{glyf, ComponentFlags};
use crate::tables::gvar::gvar;
use crate::tables::hmtx::{hmtx, vmtx};
use crate::tag;
use crate::types::round_even;
use itertools::Itertools;

/// Instance the `gvar` table against `glyf`, `hmtx` and `vmtx`.
///
/// Glyphs are processed in ascending composite depth (ties broken by glyph
/// name) so that a composite's bounding box is recomputed after its base
/// glyphs have already been instanced. Default-delta residues are folded
/// into the outline coordinates, which in turn rewrites each glyph's
/// side bearings and advance from the four phantom points.
pub fn instantiate_gvar(font: &mut Font, axis_limits: &NormalizedAxisLimits, optimize: bool) {
    log::info!("Instantiating glyf/gvar tables");

    let mut glyf = match font.remove(tag!("glyf")) {
        Some(Table::Glyf(glyf)) => glyf,
        _ => return,
    };
    let mut gvar = match font.remove(tag!("gvar")) {
        Some(Table::Gvar(gvar)) => gvar,
        _ => {
            font.insert(tag!("glyf"), Table::Glyf(glyf));
            return;
        }
    };
    let mut hmtx = match font.remove(tag!("hmtx")) {
        Some(Table::Hmtx(hmtx)) => hmtx,
        _ => Default::default(),
    };
    let mut vmtx: Option<vmtx> = match font.remove(tag!("vmtx")) {
        Some(Table::Vmtx(vmtx)) => Some(vmtx),
        _ => None,
    };

    // If a composite glyph were processed before its base glyph, its bounds
    // would be computed from coordinates the deltas haven't reached yet.
    let glyph_names: Vec<String> = glyf
        .glyph_order()
        .into_iter()
        .sorted_by_key(|name| (glyf.composite_depth(name), name.clone()))
        .collect();

    for glyph_name in &glyph_names {
        instantiate_gvar_glyph(
            &mut glyf, &mut gvar, &mut hmtx, &mut vmtx, glyph_name, axis_limits, optimize,
        );
    }

    if gvar.variations.is_empty() {
        log::info!("Dropping gvar table");
    } else {
        font.insert(tag!("gvar"), Table::Gvar(gvar));
    }
    font.insert(tag!("glyf"), Table::Glyf(glyf));
    font.insert(tag!("hmtx"), Table::Hmtx(hmtx));
    if let Some(vmtx) = vmtx {
        font.insert(tag!("vmtx"), Table::Vmtx(vmtx));
    }
}

fn instantiate_gvar_glyph(
    glyf: &mut glyf,
    gvar: &mut gvar,
    hmtx: &mut hmtx,
    vmtx: &mut Option<vmtx>,
    glyph_name: &str,
    axis_limits: &NormalizedAxisLimits,
    optimize: bool,
) {
    let glyph_index = match glyf.glyph_index(glyph_name) {
        Some(ix) => ix,
        None => return,
    };
    let (orig_coords, end_pts) = glyf.coordinates_and_ends(glyph_index, hmtx, vmtx.as_ref());

    let mut coords = orig_coords.clone();
    let has_variations = gvar
        .variations
        .get(glyph_name)
        .map_or(false, |vars| !vars.is_empty());

    if has_variations {
        let variations = gvar.variations.get_mut(glyph_name).unwrap();
        let default_deltas =
            instantiate_tuple_variation_store(variations, axis_limits, Some(&orig_coords), Some(&end_pts));
        for (coord, delta) in coords.iter_mut().zip(default_deltas.iter()) {
            if let Some(delta) = delta {
                let (dx, dy) = delta.get_2d();
                coord.0 = (coord.0 as i32 + round_even(dx)) as i16;
                coord.1 = (coord.1 as i32 + round_even(dy)) as i16;
            }
        }
    }

    // Write the coordinates back unconditionally, even when this glyph has
    // no deltas at this location: a composite's base glyph may have moved,
    // changing the composite's bounding box and sidebearings.
    glyf.set_coordinates(glyph_index, &coords, hmtx, vmtx.as_mut());

    if !has_variations {
        gvar.variations.shift_remove(glyph_name);
        return;
    }

    let variations = gvar.variations.get_mut(glyph_name).unwrap();
    if variations.is_empty() {
        log::debug!("No delta sets left for {}, dropping its variations", glyph_name);
        gvar.variations.shift_remove(glyph_name);
        return;
    }

    if optimize && !glyf.glyphs[glyph_index].is_composite() {
        for var in variations.iter_mut() {
            let deltas = std::mem::take(&mut var.deltas);
            var.deltas = iup::optimize_deltas(deltas, &coords, &end_pts);
        }
    }
}

/// Set the overlap-rendering flags on every glyph: variable fonts usually
/// have overlapping contours, and some rasterizers need the hint once the
/// font is static.
pub fn set_overlap_flags(font: &mut Font) {
    if let Some(glyf) = font.glyf_mut() {
        for glyph in glyf.glyphs.iter_mut() {
            if glyph.is_composite() {
                glyph.components[0].flags |= ComponentFlags::OVERLAP_COMPOUND;
            } else if !glyph.contours.is_empty() {
                glyph.overlap = true;
            }
        }
    }
}
