use super::patch::{RenderTriangle, SampledField, ValueRange};
use crate::geometry::Point;

use smallvec::SmallVec;

/// `count` evenly spaced iso-values spanning `range` (inclusive on both ends)
///
/// A single level sits at `range.min`. Zero levels yields an empty list.
pub fn contour_levels(count: usize, range: &ValueRange) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![range.min],
        _ => {
            let step = range.span() / (count - 1) as f64;
            (0..count).map(|i| range.min + i as f64 * step).collect()
        }
    }
}

/// Straight piece of an iso-line crossing a single triangle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IsoSegment {
    pub level: f64,
    pub start: Point,
    pub end: Point,
}

/// Piece of a triangle whose values fall between two consecutive levels
#[derive(Clone, Debug, PartialEq)]
pub struct IsoBand {
    /// Index of the lower bounding level
    pub band: usize,
    pub lower: f64,
    pub upper: f64,
    /// Convex polygon (counter-clockwise if the source triangle was); at most 5 vertices
    pub polygon: SmallVec<[Point; 5]>,
}

impl IsoBand {
    /// Twice the signed area of the polygon
    pub fn area2(&self) -> f64 {
        let n = self.polygon.len();
        (0..n)
            .map(|i| {
                let (a, b) = (self.polygon[i], self.polygon[(i + 1) % n]);
                a.x * b.y - b.x * a.y
            })
            .sum()
    }
}

/// Iso-lines and iso-bands of one value field
#[derive(Clone, Debug, Default)]
pub struct ContourSet {
    pub levels: Vec<f64>,
    pub lines: Vec<IsoSegment>,
    pub bands: Vec<IsoBand>,
}

impl ContourSet {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.bands.is_empty()
    }
}

/// Build `level_count` iso-lines and the bands between them over `field`, with levels spanning `range`
pub fn extract_contours(
    field: &SampledField,
    level_count: usize,
    range: &ValueRange,
) -> ContourSet {
    let levels = contour_levels(level_count, range);
    let lines = iso_lines(&field.triangles, &levels);
    let bands = iso_bands(&field.triangles, &levels);

    ContourSet {
        levels,
        lines,
        bands,
    }
}

/// One segment per (triangle, level) pair where the level crosses the triangle's interior
///
/// A vertex counts as "above" a level when its value is greater than or equal to it. Triangles that only touch a
/// level at a single vertex produce nothing.
pub fn iso_lines(triangles: &[RenderTriangle], levels: &[f64]) -> Vec<IsoSegment> {
    let mut segments = Vec::new();

    for tri in triangles {
        for &level in levels {
            let above = tri.values.map(|v| v >= level);
            let mut crossings: SmallVec<[Point; 2]> = SmallVec::new();

            for i in 0..3 {
                let j = (i + 1) % 3;
                if above[i] != above[j] {
                    crossings.push(edge_crossing(
                        (tri.points[i], tri.values[i]),
                        (tri.points[j], tri.values[j]),
                        level,
                    ));
                }
            }

            if let [start, end] = crossings.as_slice() {
                if start != end {
                    segments.push(IsoSegment {
                        level,
                        start: *start,
                        end: *end,
                    });
                }
            }
        }
    }

    segments
}

/// Clip every triangle to each interval `[levels[b], levels[b + 1]]`
///
/// Levels are expected in ascending order; empty intervals are skipped.
pub fn iso_bands(triangles: &[RenderTriangle], levels: &[f64]) -> Vec<IsoBand> {
    let mut bands = Vec::new();

    for tri in triangles {
        let (lo_value, hi_value) = tri
            .values
            .iter()
            .fold((f64::MAX, -f64::MAX), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        for (band, pair) in levels.windows(2).enumerate() {
            let (lower, upper) = (pair[0], pair[1]);
            if upper <= lower || hi_value < lower || lo_value > upper {
                continue;
            }

            let polygon: SmallVec<[(Point, f64); 5]> =
                (0..3).map(|i| (tri.points[i], tri.values[i])).collect();
            let polygon = clip(&polygon, lower, true);
            let polygon = clip(&polygon, upper, false);

            if polygon.len() >= 3 {
                let piece = IsoBand {
                    band,
                    lower,
                    upper,
                    polygon: polygon.iter().map(|(p, _)| *p).collect(),
                };
                // triangles only touching the interval at a vertex or an edge
                if piece.area2() != 0.0 {
                    bands.push(piece);
                }
            }
        }
    }

    bands
}

fn edge_crossing((pa, va): (Point, f64), (pb, vb): (Point, f64), level: f64) -> Point {
    pa.lerp(&pb, (level - va) / (vb - va))
}

// Sutherland-Hodgman against the half-space `value >= level` (keep_above) or `value <= level`
fn clip(
    polygon: &[(Point, f64)],
    level: f64,
    keep_above: bool,
) -> SmallVec<[(Point, f64); 5]> {
    let inside = |v: f64| if keep_above { v >= level } else { v <= level };
    let mut out = SmallVec::new();

    for i in 0..polygon.len() {
        let current = polygon[i];
        let next = polygon[(i + 1) % polygon.len()];

        if inside(current.1) {
            out.push(current);
        }
        if inside(current.1) != inside(next.1) {
            out.push((edge_crossing(current, next, level), level));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // value = x over the unit right triangle
    fn ramp_triangle() -> RenderTriangle {
        RenderTriangle::new(
            [
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(0.0, 1.0),
            ],
            [0.0, 1.0, 0.0],
        )
    }

    #[test]
    fn evenly_spaced_levels() {
        let range = ValueRange::new(-1.0, 3.0);

        assert_eq!(contour_levels(5, &range), vec![-1.0, 0.0, 1.0, 2.0, 3.0]);
        assert_eq!(contour_levels(1, &range), vec![-1.0]);
        assert!(contour_levels(0, &range).is_empty());

        let levels = contour_levels(15, &range);
        assert_eq!(levels.len(), 15);
        assert_eq!(levels[0], -1.0);
        assert!((levels[14] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn single_iso_segment() {
        let segments = iso_lines(&[ramp_triangle()], &[0.5]);

        assert_eq!(segments.len(), 1);
        let mut ends = [segments[0].start, segments[0].end];
        ends.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap());

        assert_eq!(ends[0], Point::new(0.5, 0.0));
        assert_eq!(ends[1], Point::new(0.5, 0.5));
    }

    #[test]
    fn levels_outside_the_triangle() {
        assert!(iso_lines(&[ramp_triangle()], &[-0.5, 1.5]).is_empty());

        // touching a single vertex
        assert!(iso_lines(&[ramp_triangle()], &[1.0]).is_empty());

        let flat = RenderTriangle::new(ramp_triangle().points, [2.0; 3]);
        assert!(iso_lines(&[flat], &[2.0]).is_empty());
    }

    #[test]
    fn bands_partition_the_triangle() {
        let tri = ramp_triangle();
        let bands = iso_bands(&[tri], &contour_levels(5, &ValueRange::new(0.0, 1.0)));

        assert_eq!(bands.len(), 4);
        let total: f64 = bands.iter().map(|b| b.area2()).sum();
        assert!((total - tri.area2()).abs() < 1e-12);

        for b in bands.iter() {
            assert!(b.polygon.len() >= 3 && b.polygon.len() <= 5);
            assert!(b.area2() > 0.0);
            assert!(b.polygon.iter().all(|p| p.x >= b.lower - 1e-12 && p.x <= b.upper + 1e-12));
        }
    }

    #[test]
    fn band_areas() {
        let bands = iso_bands(&[ramp_triangle()], &[0.0, 0.5, 1.0]);

        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].band, 0);
        assert!((bands[0].area2() / 2.0 - 0.375).abs() < 1e-12);
        assert!((bands[1].area2() / 2.0 - 0.125).abs() < 1e-12);
        assert_eq!(bands[1].polygon.len(), 3);
    }

    #[test]
    fn contour_set_from_field() {
        let field = SampledField {
            triangles: vec![ramp_triangle()],
            range: ValueRange::new(0.0, 1.0),
        };
        let set = extract_contours(&field, 3, &field.range);

        assert_eq!(set.levels, vec![0.0, 0.5, 1.0]);
        assert_eq!(set.lines.len(), 1);
        assert_eq!(set.bands.len(), 2);

        let empty = extract_contours(&SampledField::empty(), 3, &field.range);
        assert!(empty.is_empty());
    }
}
