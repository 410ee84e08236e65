use super::iup;
use super::locations::Support;
use crate::types::{round_even, F2DOT14, Tag};

/// Represents either a two-dimensional (`gvar`) or one-dimensional
/// (`cvar`, item variation store) delta value
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Delta {
    /// A one-dimensional delta
    Delta1D(f32),
    /// A two-dimensional delta, applied to a point's X and Y coordinates
    Delta2D((f32, f32)),
}

impl Delta {
    /// Assuming that this is a two-dimensional delta, returns the delta as an
    /// X,Y tuple.
    pub fn get_2d(&self) -> (f32, f32) {
        if let Delta::Delta2D(p) = self {
            *p
        } else {
            panic!("Tried to turn a scalar delta into a coordinate delta");
        }
    }

    /// Assuming that this is a one-dimensional delta, returns the scalar.
    pub fn get_1d(&self) -> f32 {
        if let Delta::Delta1D(d) = self {
            *d
        } else {
            panic!("Tried to turn a coordinate delta into a scalar delta");
        }
    }
}

/// How a set of values varies at one region of the design space.
///
/// The `axes` mapping gives the tent `(lower, peak, upper)` for each axis
/// that participates; a missing axis is equivalent to `(-1, 0, 1)`, i.e. the
/// axis has no influence. The delta payload is ordered: one entry per point
/// (plus the four phantom points) for outline variations, one entry per
/// value for everything else. A `None` delta is one elided by the IUP
/// encoding, to be inferred from its neighbours.
#[derive(Debug, PartialEq, Clone)]
pub struct TupleVariation {
    /// The region of the designspace over which this variation is active.
    pub axes: Support,
    /// The deltas to be applied at the peak of the region.
    pub deltas: Vec<Option<Delta>>,
}

impl TupleVariation {
    pub fn new(axes: Support, deltas: Vec<Option<Delta>>) -> Self {
        TupleVariation { axes, deltas }
    }

    /// The tent for the given axis, if the axis participates.
    pub fn tent(&self, tag: Tag) -> Option<(f32, f32, f32)> {
        self.axes.get(&tag).copied()
    }

    /// Scale every delta by the given support scalar.
    pub fn scale_deltas(&mut self, scalar: f32) {
        if (scalar - 1.0).abs() < f32::EPSILON {
            return;
        }
        for delta in self.deltas.iter_mut().flatten() {
            *delta = match *delta {
                Delta::Delta1D(d) => Delta::Delta1D(d * scalar),
                Delta::Delta2D((x, y)) => Delta::Delta2D((x * scalar, y * scalar)),
            }
        }
    }

    /// Round every delta to an integer, ties to even.
    pub fn round_deltas(&mut self) {
        for delta in self.deltas.iter_mut().flatten() {
            *delta = match *delta {
                Delta::Delta1D(d) => Delta::Delta1D(round_even(d) as f32),
                Delta::Delta2D((x, y)) => {
                    Delta::Delta2D((round_even(x) as f32, round_even(y) as f32))
                }
            }
        }
    }

    /// Add another variation's deltas onto this one's, pairwise.
    ///
    /// Used when two variations end up with identical tents after
    /// instancing. The payloads must have the same length.
    pub fn add_deltas(&mut self, other: &TupleVariation) {
        if self.deltas.len() != other.deltas.len() {
            panic!("Tried to add deltas with different lengths")
        }
        for (ours, theirs) in self.deltas.iter_mut().zip(other.deltas.iter()) {
            *ours = match (*ours, *theirs) {
                (None, None) => None,
                (Some(d), None) | (None, Some(d)) => Some(d),
                (Some(Delta::Delta1D(a)), Some(Delta::Delta1D(b))) => Some(Delta::Delta1D(a + b)),
                (Some(Delta::Delta2D((ax, ay))), Some(Delta::Delta2D((bx, by)))) => {
                    Some(Delta::Delta2D((ax + bx, ay + by)))
                }
                _ => panic!("Tried to add deltas of different dimensions"),
            }
        }
    }

    /// Fill in deltas elided by the IUP encoding.
    ///
    /// `orig_coords` are the default outline's coordinates and `end_pts` the
    /// contour end-point indices, both including the four phantom points
    /// (each phantom is its own single-point "contour").
    pub fn calc_inferred_deltas(&mut self, orig_coords: &[(i16, i16)], end_pts: &[usize]) {
        if self.deltas.iter().all(Option::is_some) {
            return;
        }
        if self.deltas.len() != orig_coords.len() {
            panic!(
                "Delta count ({}) doesn't match point count ({})",
                self.deltas.len(),
                orig_coords.len()
            );
        }
        let mut inferred: Vec<(f32, f32)> = Vec::with_capacity(self.deltas.len());
        let mut start = 0;
        for &end in end_pts {
            iup::iup_contour(
                &mut inferred,
                &self.deltas[start..=end],
                &orig_coords[start..=end],
            );
            start = end + 1;
        }
        self.deltas = inferred
            .into_iter()
            .map(|d| Some(Delta::Delta2D(d)))
            .collect();
    }

    /// A hashable key identifying this variation's region, quantized onto
    /// the 2.14 grid. Variations sharing a key can be merged.
    pub fn axes_key(&self) -> Vec<(Tag, i16, i16, i16)> {
        self.axes
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
}
