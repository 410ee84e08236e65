use crate::types::Tag;
use std::collections::BTreeMap;

/// A location as a mapping of tags to normalized (-1 <= 0 <= 1) values
pub type Location = BTreeMap<Tag, f32>;

/// A region of the designspace, consisting of a set of per-axis triangular
/// tents `(lower, peak, upper)`
pub type Support = BTreeMap<Tag, (f32, f32, f32)>;

/// Returns the contribution value of a region at a given location
///
/// An axis missing from the support does not participate, as does one whose
/// peak is 0 or whose tent straddles 0 without being anchored there.
pub fn support_scalar(loc: &Location, support: &Support) -> f32 {
    let mut scalar = 1.0;
    for (&axis, &(lower, peak, upper)) in support.iter() {
        if peak == 0.0 {
            continue;
        }
        if lower > peak || peak > upper {
            continue;
        }
        if lower < 0.0 && upper > 0.0 {
            continue;
        }
        let v: f32 = *loc.get(&axis).unwrap_or(&0.0);
        if (v - peak).abs() < f32::EPSILON {
            continue;
        }
        if v <= lower || upper <= v {
            scalar = 0.0;
            break;
        }
        if v < peak {
            scalar *= (v - lower) / (peak - lower)
        } else {
            scalar *= (v - upper) / (peak - upper)
        }
    }
    scalar
}
