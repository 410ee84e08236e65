//! Fully or partially instance a variable font.
//!
//! The run is a fixed sequence of in-place table transformations: outline
//! variations first (so metrics pick up the folded deltas), then the
//! control-value, global-metrics and advance-metrics variations, the layout
//! variation store, feature variations, and finally the axis-description
//! tables. Later stages rely on axis-record state the earlier ones still
//! need, so the order is not negotiable.

/// The axis-description tables: avar, fvar, STAT, name pruning
mod axes;
/// GSUB/GPOS feature variations
mod features;
/// The outline-variation driver
mod gvar;
/// The item-variation-store adapter
mod itemvar;
/// Axis limits: user form, normalized form, parsing and normalization
mod limits;
/// cvar, MVAR, HVAR and VVAR
mod metrics;
/// The GDEF variation store and its GPOS/GDEF referents
mod otl;
/// Pinning and range-limiting of tuple variations
mod tuplevar;

pub use itemvar::{instantiate_item_variation_store, TupleVarStoreAdapter};
pub use limits::{
    normalize, normalize_axis_limits, populate_axis_defaults, AxisRange, NormalizedAxisLimit,
    NormalizedAxisLimits, NormalizedAxisRange, UserAxisLimit, UserAxisLimits,
};
pub use tuplevar::{
    instantiate_tuple_variation_store, limit_tuple_variation_axis_range,
    limit_tuple_variation_axis_ranges, pin_tuple_variation_axes,
};

use crate::error::{Error, Result};
use crate::font::Font;
use crate::tag;

/// Options controlling an instancing run
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Re-encode the surviving outline deltas with IUP optimization.
    pub optimize: bool,
    /// On a fully-pinned result, set the overlap-rendering flag on every
    /// glyph.
    pub overlap: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            optimize: true,
            overlap: true,
        }
    }
}

fn sanity_check(font: &Font) -> Result<()> {
    if !font.contains(tag!("fvar")) {
        return Err(Error::MissingTable(tag!("fvar")));
    }
    if font.contains(tag!("gvar")) && !font.contains(tag!("glyf")) {
        return Err(Error::GvarWithoutGlyf);
    }
    if font.contains(tag!("CFF2")) {
        return Err(Error::Cff2Unsupported);
    }
    Ok(())
}

/// Instance a variable font in place, fully or partially.
///
/// `limits` maps axis tags to a pinned coordinate, a user-space range, or
/// the default sentinel. Axes not mentioned keep their full range and all
/// their variation data. When every axis is pinned the result is a static
/// font with no variation tables left.
pub fn instantiate_variable_font(
    font: &mut Font,
    limits: UserAxisLimits,
    options: &Options,
) -> Result<()> {
    sanity_check(font)?;

    let limits = populate_axis_defaults(font, limits)?;
    let normalized_limits = normalize_axis_limits(font, &limits, true)?;
    log::info!("Normalized limits: {:?}", normalized_limits);

    if font.contains(tag!("gvar")) {
        gvar::instantiate_gvar(font, &normalized_limits, options.optimize);
    }
    if font.contains(tag!("cvar")) {
        metrics::instantiate_cvar(font, &normalized_limits);
    }
    if font.contains(tag!("MVAR")) {
        metrics::instantiate_mvar(font, &normalized_limits);
    }
    if font.contains(tag!("HVAR")) {
        metrics::instantiate_hvar(font, &normalized_limits);
    }
    if font.contains(tag!("VVAR")) {
        metrics::instantiate_vvar(font, &normalized_limits);
    }

    otl::instantiate_otl(font, &normalized_limits);
    features::instantiate_feature_variations(font, &normalized_limits);

    if font.contains(tag!("avar")) {
        axes::instantiate_avar(font, &limits)?;
    }

    // The STAT and fvar rewrites may orphan name records; snapshot what the
    // variation tables reference so the leftovers can be deleted after.
    let original_name_ids = axes::variation_name_ids(font);
    if font.contains(tag!("STAT")) {
        axes::instantiate_stat(font, &limits);
    }
    axes::instantiate_fvar(font, &limits);
    axes::prune_unused_names(font, original_name_ids);

    if !font.contains(tag!("fvar")) && options.overlap && font.contains(tag!("glyf")) {
        gvar::set_overlap_flags(font);
    }

    axes::set_default_weight_width_slant(font, &limits);

    Ok(())
}

/// Like [`instantiate_variable_font`], but leaves the input untouched and
/// returns a new font.
pub fn instantiated(font: &Font, limits: UserAxisLimits, options: &Options) -> Result<Font> {
    let mut font = font.clone();
    instantiate_variable_font(&mut font, limits, options)?;
    Ok(font)
}
