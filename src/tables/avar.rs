/// A piecewise-linear remapping of one axis's normalized values
///
/// A well-formed segment map contains entries for `(-1,-1)`, `(0,0)` and
/// `(1,1)`, sorted by from-coordinate, with to-coordinates non-decreasing.
/// An empty map leaves the axis untouched.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct SegmentMap(pub Vec<(f32, f32)>);

/// Represents a font's avar (Axis Variations) table
///
/// The maps run parallel to the fvar axis records.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct avar {
    pub maps: Vec<SegmentMap>,
}

impl SegmentMap {
    /// Map a normalized (`-1.0..=1.0`) value through this segment map.
    ///
    /// Values on a key map exactly; values between keys interpolate
    /// linearly; values outside the outermost keys carry that key's offset,
    /// so a map without the usual corner anchors still maps every input.
    pub fn piecewise_linear_map(&self, val: f32) -> f32 {
        if self.0.is_empty() {
            return val;
        }
        if let Some(&(_, to)) = self.0.iter().find(|(from, _)| (from - val).abs() < f32::EPSILON) {
            return to;
        }
        let mut lowest = self.0[0];
        let mut highest = self.0[0];
        for &entry in &self.0 {
            if entry.0 < lowest.0 {
                lowest = entry;
            }
            if entry.0 > highest.0 {
                highest = entry;
            }
        }
        if val < lowest.0 {
            return val + lowest.1 - lowest.0;
        }
        if val > highest.0 {
            return val + highest.1 - highest.0;
        }
        // interpolate between the nearest keys on either side
        let mut below = lowest;
        let mut above = highest;
        for &(from, to) in &self.0 {
            if from < val && from > below.0 {
                below = (from, to);
            }
            if from > val && from < above.0 {
                above = (from, to);
            }
        }
        below.1 + (above.1 - below.1) * (val - below.0) / (above.0 - below.0)
    }

    /// Check that this segment map contains the three required anchors and
    /// that its to-coordinates are monotonic.
    pub fn is_valid(&self) -> bool {
        if self.0.is_empty() {
            return true;
        }
        let mut saw_zero = false;
        let mut saw_minus1 = false;
        let mut saw_plus1 = false;
        let mut prev_to_coordinate = -2.0;
        for &(from, to) in &self.0 {
            if from == 0.0 && to == 0.0 {
                saw_zero = true;
            }
            if (from - -1.0).abs() < f32::EPSILON && (to - -1.0).abs() < f32::EPSILON {
                saw_minus1 = true;
            }
            if (from - 1.0).abs() < f32::EPSILON && (to - 1.0).abs() < f32::EPSILON {
                saw_plus1 = true;
            }
            if to < prev_to_coordinate {
                return false;
            }
            prev_to_coordinate = to;
        }
        saw_zero && saw_minus1 && saw_plus1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piecewise_linear_map() {
        let seg = SegmentMap(vec![
            (-1.0, -1.0),
            (0.0, 0.0),
            (0.125, 0.11444092),
            (0.25, 0.23492432),
            (0.5, 0.3554077),
            (0.625, 0.5),
            (0.75, 0.6566162),
            (0.875, 0.8192749),
            (1.0, 1.0),
        ]);
        assert!((seg.piecewise_linear_map(0.0) - 0.0).abs() < f32::EPSILON);
        assert!((seg.piecewise_linear_map(1.0) - 1.0).abs() < f32::EPSILON);
        assert!((seg.piecewise_linear_map(0.625) - 0.5).abs() < f32::EPSILON);
        assert!((seg.piecewise_linear_map(0.6) - 0.47108155).abs() < f32::EPSILON);
        // values beyond the outermost keys carry that key's offset
        assert!((seg.piecewise_linear_map(-2.5) - -2.5).abs() < f32::EPSILON);
        assert!((seg.piecewise_linear_map(2.0) - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_piecewise_linear_map_one_sided() {
        // a map covering only the positive side still maps every input
        let seg = SegmentMap(vec![(0.0, 0.0), (0.5, 0.8), (1.0, 1.0)]);
        assert!((seg.piecewise_linear_map(-0.5) - -0.5).abs() < f32::EPSILON);
        assert!((seg.piecewise_linear_map(0.25) - 0.4).abs() < f32::EPSILON);
        // below the lowest key with a non-identity offset
        let shifted = SegmentMap(vec![(0.2, 0.5), (1.0, 1.0)]);
        assert!((shifted.piecewise_linear_map(0.1) - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn test_is_valid() {
        assert!(SegmentMap(vec![]).is_valid());
        assert!(SegmentMap(vec![(-1.0, -1.0), (0.0, 0.0), (1.0, 1.0)]).is_valid());
        // missing anchor
        assert!(!SegmentMap(vec![(-1.0, -1.0), (1.0, 1.0)]).is_valid());
        // non-monotonic
        assert!(!SegmentMap(vec![
            (-1.0, -1.0),
            (0.0, 0.0),
            (0.5, 0.8),
            (0.625, 0.5),
            (1.0, 1.0)
        ])
        .is_valid());
    }
}
