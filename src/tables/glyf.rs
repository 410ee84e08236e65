use crate::tables::hmtx::{hmtx, vmtx, Metric};
use crate::types::round_even;
use bitflags::bitflags;
use std::cmp::max;

bitflags! {
    /// Flags on a component of a composite glyph
    pub struct ComponentFlags: u16 {
        const ARG_1_AND_2_ARE_WORDS = 0x0001;
        const ARGS_ARE_XY_VALUES = 0x0002;
        const ROUND_XY_TO_GRID = 0x0004;
        const WE_HAVE_A_SCALE = 0x0008;
        const MORE_COMPONENTS = 0x0020;
        const WE_HAVE_AN_X_AND_Y_SCALE = 0x0040;
        const WE_HAVE_A_TWO_BY_TWO = 0x0080;
        const WE_HAVE_INSTRUCTIONS = 0x0100;
        const USE_MY_METRICS = 0x0200;
        const OVERLAP_COMPOUND = 0x0400;
        const SCALED_COMPONENT_OFFSET = 0x0800;
        const UNSCALED_COMPONENT_OFFSET = 0x1000;
    }
}

/// A point on a glyph contour
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Point {
    pub x: i16,
    pub y: i16,
    pub on_curve: bool,
}

/// A reference to another glyph placed within a composite glyph
///
/// The base glyph is referred to by name; composite glyphs therefore form a
/// name-keyed DAG, sorted topologically before instancing.
#[derive(Debug, PartialEq, Clone)]
pub struct Component {
    pub base_glyph: String,
    pub flags: ComponentFlags,
    /// X and Y offset of the component.
    pub offset: (i16, i16),
    /// An optional 2x2 transformation matrix `[xx, xy, yx, yy]`.
    pub transformation: Option<[f32; 4]>,
}

impl Component {
    fn transform(&self, x: i16, y: i16) -> (i16, i16) {
        let (x, y) = match self.transformation {
            Some([xx, xy, yx, yy]) => (
                round_even(xx * x as f32 + yx * y as f32) as i16,
                round_even(xy * x as f32 + yy * y as f32) as i16,
            ),
            None => (x, y),
        };
        (x + self.offset.0, y + self.offset.1)
    }
}

/// A higher-level representation of a TrueType outline glyph
#[derive(Debug, PartialEq, Clone)]
pub struct Glyph {
    /// The glyph's name, as used by `gvar` and composite references.
    pub name: String,
    /// The minimum X coordinate of points (including transformed component points) within this glyph
    pub xMin: i16,
    /// The maximum X coordinate of points (including transformed component points) within this glyph
    pub xMax: i16,
    /// The minimum Y coordinate of points (including transformed component points) within this glyph
    pub yMin: i16,
    /// The maximum Y coordinate of points (including transformed component points) within this glyph
    pub yMax: i16,
    /// A list of contours, each contour represented as a list of `Point` objects.
    pub contours: Vec<Vec<Point>>,
    /// Truetype instructions (binary)
    pub instructions: Vec<u8>,
    /// A vector of components
    pub components: Vec<Component>,
    /// Whether this glyph's outline is known to contain overlaps.
    pub overlap: bool,
}

impl Glyph {
    pub fn empty(name: &str) -> Self {
        Glyph {
            name: name.to_string(),
            xMin: 0,
            xMax: 0,
            yMin: 0,
            yMax: 0,
            contours: vec![],
            instructions: vec![],
            components: vec![],
            overlap: false,
        }
    }

    pub fn is_composite(&self) -> bool {
        !self.components.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.contours.is_empty()
    }

    /// The number of outline points (component count for composites).
    pub fn num_points(&self) -> usize {
        if self.is_composite() {
            self.components.len()
        } else {
            self.contours.iter().map(|c| c.len()).sum()
        }
    }

    /// Indices of the last point of each contour. For a composite glyph,
    /// each component offset counts as its own single-point contour.
    pub fn end_points(&self) -> Vec<usize> {
        if self.is_composite() {
            (0..self.components.len()).collect()
        } else {
            let mut ends = vec![];
            let mut total = 0;
            for contour in &self.contours {
                total += contour.len();
                ends.push(total - 1);
            }
            ends
        }
    }
}

/// Represents a font's glyf (Glyph Data) table
#[derive(Debug, PartialEq, Clone, Default)]
pub struct glyf {
    /// A list of glyph objects, in glyph-id order
    pub glyphs: Vec<Glyph>,
}

impl glyf {
    /// The glyph id for a given glyph name.
    pub fn glyph_index(&self, name: &str) -> Option<usize> {
        self.glyphs.iter().position(|g| g.name == name)
    }

    pub fn glyph(&self, name: &str) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.name == name)
    }

    /// The glyph names, in glyph-id order.
    pub fn glyph_order(&self) -> Vec<String> {
        self.glyphs.iter().map(|g| g.name.clone()).collect()
    }

    /// How deeply nested a glyph is: 0 for simple glyphs, 1 for a composite
    /// of simple glyphs, and so on. A base glyph must be instanced before
    /// any glyph at a greater depth that uses it.
    pub fn composite_depth(&self, name: &str) -> usize {
        match self.glyph(name) {
            Some(g) if g.is_composite() => {
                1 + g
                    .components
                    .iter()
                    .map(|component| self.composite_depth(&component.base_glyph))
                    .fold(0, max)
            }
            _ => 0,
        }
    }

    /// All of a glyph's points with components resolved recursively.
    fn decomposed_points(&self, glyph: &Glyph) -> Vec<(i16, i16)> {
        if !glyph.is_composite() {
            return glyph
                .contours
                .iter()
                .flatten()
                .map(|p| (p.x, p.y))
                .collect();
        }
        let mut points = vec![];
        for component in &glyph.components {
            if let Some(base) = self.glyph(&component.base_glyph) {
                points.extend(
                    self.decomposed_points(base)
                        .into_iter()
                        .map(|(x, y)| component.transform(x, y)),
                );
            }
        }
        points
    }

    /// Recompute a glyph's bounding box from its (decomposed) points.
    pub fn recalc_bounds(&mut self, glyph_index: usize) {
        let points = self.decomposed_points(&self.glyphs[glyph_index]);
        let glyph = &mut self.glyphs[glyph_index];
        if points.is_empty() {
            glyph.xMin = 0;
            glyph.xMax = 0;
            glyph.yMin = 0;
            glyph.yMax = 0;
            return;
        }
        glyph.xMin = points.iter().map(|p| p.0).min().unwrap();
        glyph.xMax = points.iter().map(|p| p.0).max().unwrap();
        glyph.yMin = points.iter().map(|p| p.1).min().unwrap();
        glyph.yMax = points.iter().map(|p| p.1).max().unwrap();
    }

    /// A glyph's variation coordinates plus contour end-point indices.
    ///
    /// For a simple glyph the coordinates are its outline points; for a
    /// composite they are the component offsets. The four phantom points
    /// (left origin, advance, top origin, vertical advance) are appended,
    /// each as its own single-point contour, matching the deltas carried by
    /// `gvar`.
    pub fn coordinates_and_ends(
        &self,
        glyph_index: usize,
        hmtx: &hmtx,
        vmtx: Option<&vmtx>,
    ) -> (Vec<(i16, i16)>, Vec<usize>) {
        let glyph = &self.glyphs[glyph_index];
        let mut coords: Vec<(i16, i16)> = if glyph.is_composite() {
            glyph.components.iter().map(|c| c.offset).collect()
        } else {
            glyph
                .contours
                .iter()
                .flatten()
                .map(|p| (p.x, p.y))
                .collect()
        };
        let mut ends = glyph.end_points();

        let metric = hmtx.metrics.get(glyph_index).copied().unwrap_or(Metric {
            advance: 0,
            sideBearing: 0,
        });
        let left_side_x = glyph.xMin - metric.sideBearing;
        let right_side_x = left_side_x + metric.advance as i16;
        let (top_side_y, bottom_side_y) = match vmtx.and_then(|v| v.metrics.get(glyph_index)) {
            Some(vmetric) => {
                let top = glyph.yMax + vmetric.sideBearing;
                (top, top - vmetric.advance as i16)
            }
            None => (0, 0),
        };
        coords.push((left_side_x, 0));
        coords.push((right_side_x, 0));
        coords.push((0, top_side_y));
        coords.push((0, bottom_side_y));
        let n = coords.len();
        ends.extend_from_slice(&[n - 4, n - 3, n - 2, n - 1]);
        (coords, ends)
    }

    /// Write a glyph's coordinates back, including the four phantom points.
    ///
    /// The glyph's bounding box is recomputed and its hmtx (and, when
    /// present, vmtx) entry rewritten from the phantom points.
    pub fn set_coordinates(
        &mut self,
        glyph_index: usize,
        coords: &[(i16, i16)],
        hmtx: &mut hmtx,
        vmtx: Option<&mut vmtx>,
    ) {
        assert!(coords.len() >= 4, "Not enough coordinates for phantom points");
        let n = coords.len();
        let left_side_x = coords[n - 4].0;
        let right_side_x = coords[n - 3].0;
        let top_side_y = coords[n - 2].1;
        let bottom_side_y = coords[n - 1].1;
        let outline = &coords[..n - 4];

        let glyph = &mut self.glyphs[glyph_index];
        if glyph.is_composite() {
            assert_eq!(
                outline.len(),
                glyph.components.len(),
                "Wrong number of component offsets for glyph"
            );
            for (component, &offset) in glyph.components.iter_mut().zip(outline.iter()) {
                component.offset = offset;
            }
        } else {
            assert_eq!(
                outline.len(),
                glyph.contours.iter().map(|c| c.len()).sum::<usize>(),
                "Wrong number of coordinates for glyph"
            );
            let mut it = outline.iter();
            for contour in glyph.contours.iter_mut() {
                for point in contour.iter_mut() {
                    let &(x, y) = it.next().unwrap();
                    point.x = x;
                    point.y = y;
                }
            }
        }
        self.recalc_bounds(glyph_index);

        let glyph = &self.glyphs[glyph_index];
        let advance = max(0, right_side_x as i32 - left_side_x as i32) as u16;
        if let Some(metric) = hmtx.metrics.get_mut(glyph_index) {
            *metric = Metric {
                advance,
                sideBearing: glyph.xMin - left_side_x,
            };
        }
        if let Some(vmtx) = vmtx {
            if let Some(vmetric) = vmtx.metrics.get_mut(glyph_index) {
                *vmetric = Metric {
                    advance: max(0, top_side_y as i32 - bottom_side_y as i32) as u16,
                    sideBearing: top_side_y - glyph.yMax,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(name: &str, size: i16) -> Glyph {
        Glyph {
            name: name.to_string(),
            xMin: 0,
            xMax: size,
            yMin: 0,
            yMax: size,
            contours: vec![vec![
                Point { x: 0, y: 0, on_curve: true },
                Point { x: 0, y: size, on_curve: true },
                Point { x: size, y: size, on_curve: true },
                Point { x: size, y: 0, on_curve: true },
            ]],
            instructions: vec![],
            components: vec![],
            overlap: false,
        }
    }

    fn test_glyf() -> (glyf, hmtx) {
        let mut composite = Glyph::empty("aacute");
        composite.components = vec![
            Component {
                base_glyph: "a".to_string(),
                flags: ComponentFlags::ARGS_ARE_XY_VALUES,
                offset: (0, 0),
                transformation: None,
            },
            Component {
                base_glyph: "acutecomb".to_string(),
                flags: ComponentFlags::ARGS_ARE_XY_VALUES,
                offset: (30, 120),
                transformation: None,
            },
        ];
        let glyf = glyf {
            glyphs: vec![
                Glyph::empty(".notdef"),
                square("a", 100),
                square("acutecomb", 20),
                composite,
            ],
        };
        let hmtx = hmtx {
            metrics: vec![
                Metric { advance: 0, sideBearing: 0 },
                Metric { advance: 120, sideBearing: 10 },
                Metric { advance: 40, sideBearing: 5 },
                Metric { advance: 120, sideBearing: 10 },
            ],
        };
        (glyf, hmtx)
    }

    #[test]
    fn test_composite_depth() {
        let (glyf, _) = test_glyf();
        assert_eq!(glyf.composite_depth("a"), 0);
        assert_eq!(glyf.composite_depth("aacute"), 1);
    }

    #[test]
    fn test_coordinates_and_ends() {
        let (glyf, hmtx) = test_glyf();
        let ix = glyf.glyph_index("a").unwrap();
        let (coords, ends) = glyf.coordinates_and_ends(ix, &hmtx, None);
        assert_eq!(coords.len(), 8);
        // phantom points: left origin at xMin - lsb, advance to its right
        assert_eq!(coords[4], (-10, 0));
        assert_eq!(coords[5], (110, 0));
        assert_eq!(ends, vec![3, 4, 5, 6, 7]);

        let ix = glyf.glyph_index("aacute").unwrap();
        let (coords, ends) = glyf.coordinates_and_ends(ix, &hmtx, None);
        assert_eq!(&coords[..2], &[(0, 0), (30, 120)]);
        assert_eq!(ends, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_set_coordinates_updates_metrics() {
        let (mut glyf, mut hmtx) = test_glyf();
        let ix = glyf.glyph_index("a").unwrap();
        let (mut coords, _) = glyf.coordinates_and_ends(ix, &hmtx, None);
        // widen the right-hand points and the advance phantom by 50
        coords[2].0 += 50;
        coords[3].0 += 50;
        coords[5].0 += 50;
        glyf.set_coordinates(ix, &coords, &mut hmtx, None);
        assert_eq!(glyf.glyphs[ix].xMax, 150);
        assert_eq!(hmtx.metrics[ix].advance, 170);
        assert_eq!(hmtx.metrics[ix].sideBearing, 10);
    }

    #[test]
    fn test_composite_bounds_follow_base() {
        let (mut glyf, _) = test_glyf();
        // grow the base glyph, then recompute the composite's bounds
        let a = glyf.glyph_index("a").unwrap();
        for point in glyf.glyphs[a].contours[0].iter_mut() {
            if point.x == 100 {
                point.x = 160;
            }
        }
        glyf.recalc_bounds(a);
        let composite = glyf.glyph_index("aacute").unwrap();
        glyf.recalc_bounds(composite);
        assert_eq!(glyf.glyphs[composite].xMax, 160);
    }
}
