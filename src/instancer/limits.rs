use crate::error::{Error, Result};
use crate::font::Font;
use crate::otvar::Location;
use crate::tables::avar::SegmentMap;
use crate::tag;
use crate::types::{str_to_fixed_to_float, F2DOT14, Tag};
use std::collections::BTreeMap;

/// A closed user-space range on one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    minimum: f32,
    maximum: f32,
}

impl AxisRange {
    pub fn new(minimum: f32, maximum: f32) -> Result<Self> {
        if minimum > maximum {
            return Err(Error::InvalidRange { minimum, maximum });
        }
        Ok(AxisRange { minimum, maximum })
    }

    pub fn minimum(&self) -> f32 {
        self.minimum
    }

    pub fn maximum(&self) -> f32 {
        self.maximum
    }
}

/// A range in normalized coordinates: within -1..=1 and straddling 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedAxisRange {
    minimum: f32,
    maximum: f32,
}

impl NormalizedAxisRange {
    pub fn new(minimum: f32, maximum: f32) -> Result<Self> {
        if minimum > maximum {
            return Err(Error::InvalidRange { minimum, maximum });
        }
        if minimum < -1.0 || maximum > 1.0 {
            return Err(Error::RangeNotNormalized { minimum, maximum });
        }
        if minimum > 0.0 || maximum < 0.0 {
            return Err(Error::RangeExcludesZero { minimum, maximum });
        }
        Ok(NormalizedAxisRange { minimum, maximum })
    }

    pub fn minimum(&self) -> f32 {
        self.minimum
    }

    pub fn maximum(&self) -> f32 {
        self.maximum
    }
}

/// What the user asked for on one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserAxisLimit {
    /// Pin the axis to a single user-space coordinate, removing it.
    Pin(f32),
    /// Restrict the axis to a sub-range, keeping it.
    Range(AxisRange),
    /// Pin the axis at its fvar default (the `drop` spelling on the command
    /// line); resolved to `Pin` before normalization.
    Default,
}

/// The user's limits for the whole instancing run, keyed by axis tag
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserAxisLimits(pub BTreeMap<Tag, UserAxisLimit>);

impl UserAxisLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse textual limits of the form `TAG=value`, `TAG=min:max` or
    /// `TAG=drop`. Numbers are quantized onto the 16.16 fixed-point grid to
    /// match the precision of values stored in the font.
    pub fn parse(args: &[&str]) -> Result<Self> {
        let mut limits = BTreeMap::new();
        for arg in args {
            let (tag_part, spec) = arg
                .split_once('=')
                .ok_or_else(|| Error::InvalidLimit(arg.to_string()))?;
            let tag =
                Tag::from_raw(tag_part).ok_or_else(|| Error::InvalidLimit(arg.to_string()))?;
            let limit = if spec == "drop" {
                UserAxisLimit::Default
            } else {
                match spec.split_once(':') {
                    None => {
                        let v = str_to_fixed_to_float(spec)
                            .ok_or_else(|| Error::InvalidLimit(arg.to_string()))?;
                        UserAxisLimit::Pin(v)
                    }
                    Some((lo, hi)) => {
                        let lo = str_to_fixed_to_float(lo)
                            .ok_or_else(|| Error::InvalidLimit(arg.to_string()))?;
                        let hi = str_to_fixed_to_float(hi)
                            .ok_or_else(|| Error::InvalidLimit(arg.to_string()))?;
                        if (lo - hi).abs() < f32::EPSILON {
                            UserAxisLimit::Pin(lo)
                        } else {
                            UserAxisLimit::Range(AxisRange::new(lo, hi)?)
                        }
                    }
                }
            };
            if limits.insert(tag, limit).is_some() {
                return Err(Error::DuplicateLimit(tag));
            }
        }
        Ok(UserAxisLimits(limits))
    }

    /// Partition into pinned locations and ranged axes. `Default` sentinels
    /// are skipped; resolve them with [`populate_axis_defaults`] first.
    pub fn split_up(&self) -> (Location, BTreeMap<Tag, AxisRange>) {
        let mut location = Location::new();
        let mut ranges = BTreeMap::new();
        for (&tag, limit) in &self.0 {
            match limit {
                UserAxisLimit::Pin(value) => {
                    location.insert(tag, *value);
                }
                UserAxisLimit::Range(range) => {
                    ranges.insert(tag, *range);
                }
                UserAxisLimit::Default => {}
            }
        }
        (location, ranges)
    }
}

/// A normalized limit for one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizedAxisLimit {
    Pin(f32),
    Range(NormalizedAxisRange),
}

/// Normalized limits for the whole run, keyed by axis tag
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedAxisLimits(pub BTreeMap<Tag, NormalizedAxisLimit>);

impl NormalizedAxisLimits {
    /// Partition into pinned locations and ranged axes.
    pub fn split_up(&self) -> (Location, BTreeMap<Tag, NormalizedAxisRange>) {
        let mut location = Location::new();
        let mut ranges = BTreeMap::new();
        for (&tag, limit) in &self.0 {
            match limit {
                NormalizedAxisLimit::Pin(value) => {
                    location.insert(tag, *value);
                }
                NormalizedAxisLimit::Range(range) => {
                    ranges.insert(tag, *range);
                }
            }
        }
        (location, ranges)
    }

    /// The set of pinned axis tags.
    pub fn pinned_axes(&self) -> Vec<Tag> {
        self.0
            .iter()
            .filter(|(_, limit)| matches!(limit, NormalizedAxisLimit::Pin(_)))
            .map(|(&tag, _)| tag)
            .collect()
    }
}

/// Resolve `Default` sentinels against the fvar default values.
pub fn populate_axis_defaults(font: &Font, mut limits: UserAxisLimits) -> Result<UserAxisLimits> {
    let fvar = font
        .fvar()
        .ok_or_else(|| Error::MissingTable(tag!("fvar")))?;
    for (tag, limit) in limits.0.iter_mut() {
        if matches!(limit, UserAxisLimit::Default) {
            let axis = fvar.axis(*tag).ok_or(Error::UnknownAxis(*tag))?;
            *limit = UserAxisLimit::Pin(axis.defaultValue);
        }
    }
    Ok(limits)
}

/// Map one user-space value to a normalized -1..=1 coordinate.
///
/// The value is clamped to the axis extent, mapped linearly onto either side
/// of the default, put through the avar segment map when one applies, and
/// quantized onto the 2.14 grid.
pub fn normalize(value: f32, triple: (f32, f32, f32), avar_segment: Option<&SegmentMap>) -> f32 {
    let (lower, default, upper) = triple;
    let v = value.max(lower).min(upper);
    let mut normalized = if (v - default).abs() < f32::EPSILON {
        0.0
    } else if v < default {
        if (default - lower).abs() < f32::EPSILON {
            0.0
        } else {
            (v - default) / (default - lower)
        }
    } else if (upper - default).abs() < f32::EPSILON {
        0.0
    } else {
        (v - default) / (upper - default)
    };
    if let Some(map) = avar_segment {
        normalized = map.piecewise_linear_map(normalized);
    }
    F2DOT14::quantize(normalized)
}

/// Normalize every limit through the fvar axis triples (and avar, unless
/// `using_avar` is off). Fails on unknown axes and on ranges that do not
/// contain the axis default.
pub fn normalize_axis_limits(
    font: &Font,
    limits: &UserAxisLimits,
    using_avar: bool,
) -> Result<NormalizedAxisLimits> {
    let fvar = font
        .fvar()
        .ok_or_else(|| Error::MissingTable(tag!("fvar")))?;
    // A malformed segment map is a recoverable problem: warn and normalize
    // that axis without it, matching how the avar rebasing pass treats it.
    let avar_segments: BTreeMap<Tag, &SegmentMap> = if using_avar {
        match font.avar() {
            Some(avar) => fvar
                .axis_tags()
                .into_iter()
                .zip(avar.maps.iter())
                .filter(|(tag, map)| {
                    if map.is_valid() {
                        true
                    } else {
                        log::warn!(
                            "Invalid avar SegmentMap record for axis '{}': missing anchors or non-monotonic; not used for normalization",
                            tag
                        );
                        false
                    }
                })
                .collect(),
            None => BTreeMap::new(),
        }
    } else {
        BTreeMap::new()
    };

    let mut normalized = BTreeMap::new();
    for (&tag, limit) in &limits.0 {
        let axis = fvar.axis(tag).ok_or(Error::UnknownAxis(tag))?;
        let triple = axis.triple();
        let avar_mapping = avar_segments.get(&tag).copied();
        match limit {
            UserAxisLimit::Pin(value) => {
                normalized.insert(
                    tag,
                    NormalizedAxisLimit::Pin(normalize(*value, triple, avar_mapping)),
                );
            }
            UserAxisLimit::Range(range) => {
                if range.minimum() > axis.defaultValue || range.maximum() < axis.defaultValue {
                    return Err(Error::RangeExcludesDefault {
                        tag,
                        minimum: range.minimum(),
                        maximum: range.maximum(),
                        default: axis.defaultValue,
                    });
                }
                normalized.insert(
                    tag,
                    NormalizedAxisLimit::Range(NormalizedAxisRange::new(
                        normalize(range.minimum(), triple, avar_mapping),
                        normalize(range.maximum(), triple, avar_mapping),
                    )?),
                );
            }
            UserAxisLimit::Default => {
                unreachable!("default sentinels are resolved before normalizing")
            }
        }
    }
    Ok(NormalizedAxisLimits(normalized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_parse_limits() {
        let limits =
            UserAxisLimits::parse(&["wght=400", "wdth=75:125", "opsz=drop", "GRAD=10:10"]).unwrap();
        assert_eq!(limits.0[&tag!("wght")], UserAxisLimit::Pin(400.0));
        assert_eq!(
            limits.0[&tag!("wdth")],
            UserAxisLimit::Range(AxisRange::new(75.0, 125.0).unwrap())
        );
        assert_eq!(limits.0[&tag!("opsz")], UserAxisLimit::Default);
        // a degenerate range is a pin
        assert_eq!(limits.0[&tag!("GRAD")], UserAxisLimit::Pin(10.0));
    }

    #[test]
    fn test_parse_limits_rejects_garbage() {
        assert!(matches!(
            UserAxisLimits::parse(&["wght"]),
            Err(Error::InvalidLimit(_))
        ));
        assert!(matches!(
            UserAxisLimits::parse(&["toolong=1"]),
            Err(Error::InvalidLimit(_))
        ));
        assert!(matches!(
            UserAxisLimits::parse(&["wght=min:max"]),
            Err(Error::InvalidLimit(_))
        ));
        assert!(matches!(
            UserAxisLimits::parse(&["wght=700:400"]),
            Err(Error::InvalidRange { .. })
        ));
        assert!(matches!(
            UserAxisLimits::parse(&["wght=400", "wght=700"]),
            Err(Error::DuplicateLimit(_))
        ));
    }

    #[test]
    fn test_normalize() {
        let triple = (100.0, 400.0, 900.0);
        assert_approx_eq!(normalize(400.0, triple, None), 0.0);
        assert_approx_eq!(normalize(100.0, triple, None), -1.0);
        assert_approx_eq!(normalize(900.0, triple, None), 1.0);
        assert_approx_eq!(normalize(650.0, triple, None), 0.5);
        // clamped to the axis extent
        assert_approx_eq!(normalize(1000.0, triple, None), 1.0);
        // degenerate sides map to 0
        assert_approx_eq!(normalize(250.0, (400.0, 400.0, 900.0), None), 0.0);
    }

    #[test]
    fn test_normalize_quantizes() {
        // 0.1 is not representable in 2.14; the result must be on the grid
        let v = normalize(450.0, (100.0, 400.0, 900.0), None);
        assert_eq!(v, F2DOT14::quantize(v));
    }

    #[test]
    fn test_normalize_through_avar() {
        let seg = SegmentMap(vec![(-1.0, -1.0), (0.0, 0.0), (0.5, 0.8), (1.0, 1.0)]);
        let triple = (100.0, 400.0, 900.0);
        assert_approx_eq!(normalize(650.0, triple, Some(&seg)), 0.79998779);
    }

    #[test]
    fn test_malformed_avar_skipped_when_normalizing() {
        use crate::font::Table;
        use crate::tables::avar::avar;
        use crate::tables::fvar::{fvar, VariationAxisRecord};

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
        // one-sided map: the (-1,-1) anchor is missing
        font.insert(
            tag!("avar"),
            Table::Avar(avar {
                maps: vec![SegmentMap(vec![(0.0, 0.0), (0.5, 0.8), (1.0, 1.0)])],
            }),
        );
        let limits = UserAxisLimits::parse(&["wght=200"]).unwrap();
        let normalized = normalize_axis_limits(&font, &limits, true).unwrap();
        // the malformed map is skipped; the value normalizes as if the font
        // had no avar at all
        assert_eq!(
            normalized.0[&tag!("wght")],
            NormalizedAxisLimit::Pin(normalize(200.0, (100.0, 400.0, 900.0), None))
        );
    }

    #[test]
    fn test_normalized_range_validation() {
        assert!(NormalizedAxisRange::new(-0.5, 0.5).is_ok());
        assert!(matches!(
            NormalizedAxisRange::new(-1.5, 0.5),
            Err(Error::RangeNotNormalized { .. })
        ));
        assert!(matches!(
            NormalizedAxisRange::new(0.25, 0.75),
            Err(Error::RangeExcludesZero { .. })
        ));
    }
}
