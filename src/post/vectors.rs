use super::patch::{RenderTriangle, SampledField, ValueRange};
use crate::geometry::{BoundingBox, Point, V2D};

use log::warn;
use std::collections::HashSet;

/// A mesh triangle carrying a 2D vector value at each vertex
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VectorTriangle {
    pub points: [Point; 3],
    pub vectors: [V2D; 3],
}

impl VectorTriangle {
    pub const fn new(points: [Point; 3], vectors: [V2D; 3]) -> Self {
        Self { points, vectors }
    }

    /// Combine the x- and y-component samples of the same triangle
    ///
    /// Panics if the two triangles do not share their points
    pub fn from_components(x: &RenderTriangle, y: &RenderTriangle) -> Self {
        assert_eq!(
            x.points, y.points,
            "X and Y component triangles must coincide; Cannot build VectorTriangle!"
        );

        Self {
            points: x.points,
            vectors: [0, 1, 2].map(|i| V2D::from([x.values[i], y.values[i]])),
        }
    }

    /// Twice the signed area (positive for counter-clockwise vertex order)
    pub fn area2(&self) -> f64 {
        let [a, b, c] = self.points;
        a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let [a, b, c] = self.points;
        BoundingBox::new(
            Point::new(a.x.min(b.x).min(c.x), a.y.min(b.y).min(c.y)),
            Point::new(a.x.max(b.x).max(c.x), a.y.max(b.y).max(c.y)),
        )
    }

    /// True if `p` lies inside or on the boundary of the triangle (either winding)
    pub fn contains(&self, p: &Point) -> bool {
        let orientation = self.area2().signum();

        (0..3).all(|l| {
            let next = (l + 1) % 3;
            p.side_of(&self.points[l], &self.points[next]) * orientation >= 0.0
        })
    }
}

/// Zip the x- and y-component fields (sampled from the same patches) into [VectorTriangle]s
///
/// Panics if the two fields do not have the same number of triangles
pub fn zip_components(x: &SampledField, y: &SampledField) -> Vec<VectorTriangle> {
    assert_eq!(
        x.triangles.len(),
        y.triangles.len(),
        "X and Y component fields must have the same number of triangles!"
    );

    x.triangles
        .iter()
        .zip(y.triangles.iter())
        .map(|(tx, ty)| VectorTriangle::from_components(tx, ty))
        .collect()
}

/// Range of the vertex vector magnitudes
pub fn magnitude_range(triangles: &[VectorTriangle]) -> ValueRange {
    let mut range = ValueRange::empty();
    for vector in triangles.iter().flat_map(|t| t.vectors.iter()) {
        range.include(vector.norm());
    }
    range
}

/// Grid spacing that places roughly `glyph_count` glyphs along the scene's width plus height
pub fn grid_step(scene: &BoundingBox, glyph_count: usize) -> f64 {
    (scene.width() + scene.height()) / glyph_count as f64
}

/// Parameters of a glyph sampling pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphParams {
    /// Distance between neighboring grid points
    pub grid_step: f64,
    /// Glyph length as a multiple of `grid_step`
    pub scale: f64,
    /// Attach the magnitude normalized to `range` to each sample
    pub proportional: bool,
    /// Magnitude range used for proportional lengths
    pub range: ValueRange,
}

/// One arrow of a vector plot
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VectorGlyphSample {
    pub position: Point,
    /// Scaled direction (`scale * grid_step` long)
    pub direction: V2D,
    /// Magnitude of the interpolated vector
    pub magnitude: f64,
    /// `(magnitude - min) / (max - min)` clamped to `[0, 1]`, when proportional lengths were requested against a
    /// non-degenerate range
    ///
    /// The range is taken over vertex magnitudes, so interpolated magnitudes can fall outside of it.
    pub proportional: Option<f64>,
}

// d = a + b * x + c * y
#[derive(Clone, Copy, Debug)]
struct AffinePlane {
    a: f64,
    b: f64,
    c: f64,
}

impl AffinePlane {
    fn at(&self, p: &Point) -> f64 {
        self.a + self.b * p.x + self.c * p.y
    }
}

// affine fit of both vector components through the three vertices; None for degenerate triangles
fn fit_planes(triangle: &VectorTriangle) -> Option<[AffinePlane; 2]> {
    let area2 = triangle.area2();
    if area2 == 0.0 {
        return None;
    }

    let [a, b, c] = triangle.points;

    let aa = b.x * c.y - c.x * b.y;
    let ab = c.x * a.y - a.x * c.y;
    let ac = a.x * b.y - b.x * a.y;
    let ba = b.y - c.y;
    let bb = c.y - a.y;
    let bc = a.y - b.y;
    let ca = c.x - b.x;
    let cb = a.x - c.x;
    let cc = b.x - a.x;

    Some([0, 1].map(|comp| {
        let [v0, v1, v2] = triangle.vectors.map(|v| v[comp]);
        AffinePlane {
            a: (aa * v0 + ab * v1 + ac * v2) / area2,
            b: (ba * v0 + bb * v1 + bc * v2) / area2,
            c: (ca * v0 + cb * v1 + cc * v2) / area2,
        }
    }))
}

/// Sample a piecewise linear vector field on a staggered regular grid
///
/// Grid point `(j, k)` sits at `(j * step, k * step)`, shifted by half a step in x on rows where `k` is even. Each
/// grid point inside (or on the boundary of) some triangle produces exactly one [VectorGlyphSample]. Degenerate
/// (zero-area) triangles are skipped. The order of the returned samples is unspecified.
pub fn sample_vector_field(
    triangles: &[VectorTriangle],
    params: &GlyphParams,
) -> Vec<VectorGlyphSample> {
    let gs = params.grid_step;
    if !(gs.is_finite() && gs > 0.0) {
        warn!(
            "Invalid vector grid step ({}); Cannot sample vector field!",
            gs
        );
        return Vec::new();
    }

    let normalize = params.proportional && !params.range.is_degenerate();
    let glyph_length = params.scale * gs;

    let mut occupied: HashSet<(i64, i64)> = HashSet::new();
    let mut samples = Vec::new();

    for triangle in triangles {
        let planes = match fit_planes(triangle) {
            Some(planes) => planes,
            None => continue,
        };
        let bb = triangle.bounding_box();

        for j in (bb.start.x / gs).floor() as i64..(bb.end.x / gs).ceil() as i64 {
            for k in (bb.start.y / gs).floor() as i64..(bb.end.y / gs).ceil() as i64 {
                let mut point = Point::new(j as f64 * gs, k as f64 * gs);
                if k % 2 == 0 {
                    point.x += gs / 2.0;
                }

                if occupied.contains(&(j, k)) || !triangle.contains(&point) {
                    continue;
                }
                occupied.insert((j, k));

                let value = V2D::from([planes[0].at(&point), planes[1].at(&point)]);
                let magnitude = value.norm();

                samples.push(VectorGlyphSample {
                    position: point,
                    direction: V2D::polar(glyph_length, value.angle()),
                    magnitude,
                    proportional: if normalize {
                        Some(params.range.normalize(magnitude).clamp(0.0, 1.0))
                    } else {
                        None
                    },
                });
            }
        }
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix3, Vector3};

    fn right_triangle(vectors: [V2D; 3]) -> VectorTriangle {
        VectorTriangle::new(
            [
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(0.0, 1.0),
            ],
            vectors,
        )
    }

    fn params(grid_step: f64) -> GlyphParams {
        GlyphParams {
            grid_step,
            scale: 0.5,
            proportional: false,
            range: ValueRange::new(0.0, 1.0),
        }
    }

    #[test]
    fn uniform_field_samples() {
        let tri = right_triangle([V2D::from([2.0, 0.0]); 3]);
        let samples = sample_vector_field(&[tri], &params(0.25));

        assert_eq!(samples.len(), 12);
        for s in samples.iter() {
            assert!(tri.contains(&s.position));
            assert!((s.magnitude - 2.0).abs() < 1e-12);
            assert!((s.direction.x() - 0.125).abs() < 1e-12);
            assert!(s.direction.y().abs() < 1e-12);
            assert!(s.proportional.is_none());
        }
    }

    #[test]
    fn linear_field_is_reproduced() {
        // v(x, y) = (x + 1, 2y - x)
        let field = |p: Point| V2D::from([p.x + 1.0, 2.0 * p.y - p.x]);
        let points = [
            Point::new(0.2, 0.1),
            Point::new(1.7, 0.4),
            Point::new(0.9, 1.3),
        ];
        let tri = VectorTriangle::new(points, points.map(field));

        let samples = sample_vector_field(&[tri], &params(0.1));
        assert!(!samples.is_empty());
        for s in samples {
            assert!((s.magnitude - field(s.position).norm()).abs() < 1e-12);
        }
    }

    #[test]
    fn affine_fit_matches_dense_solve() {
        let points = [
            Point::new(-0.3, 0.2),
            Point::new(1.1, -0.4),
            Point::new(0.6, 0.9),
        ];
        let tri = VectorTriangle::new(
            points,
            [
                V2D::from([1.0, -2.0]),
                V2D::from([0.5, 3.0]),
                V2D::from([-1.5, 0.25]),
            ],
        );
        let planes = fit_planes(&tri).unwrap();

        let m = Matrix3::from_fn(|r, c| match c {
            0 => 1.0,
            1 => points[r].x,
            _ => points[r].y,
        });
        let lu = m.lu();

        for comp in 0..2 {
            let rhs = Vector3::from_fn(|r, _| tri.vectors[r][comp]);
            let coeffs = lu.solve(&rhs).unwrap();

            assert!((planes[comp].a - coeffs[0]).abs() < 1e-12);
            assert!((planes[comp].b - coeffs[1]).abs() < 1e-12);
            assert!((planes[comp].c - coeffs[2]).abs() < 1e-12);
        }
    }

    #[test]
    fn winding_does_not_matter() {
        let ccw = right_triangle([V2D::from([1.0, 1.0]); 3]);
        let cw = VectorTriangle::new(
            [ccw.points[0], ccw.points[2], ccw.points[1]],
            ccw.vectors,
        );
        assert!(ccw.area2() > 0.0 && cw.area2() < 0.0);

        let mut a: Vec<(f64, f64)> = sample_vector_field(&[ccw], &params(0.2))
            .iter()
            .map(|s| (s.position.x, s.position.y))
            .collect();
        let mut b: Vec<(f64, f64)> = sample_vector_field(&[cw], &params(0.2))
            .iter()
            .map(|s| (s.position.x, s.position.y))
            .collect();
        a.sort_by(|p, q| p.partial_cmp(q).unwrap());
        b.sort_by(|p, q| p.partial_cmp(q).unwrap());

        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_triangles_are_skipped() {
        let collinear = VectorTriangle::new(
            [
                Point::new(0.0, 0.0),
                Point::new(1.0, 1.0),
                Point::new(2.0, 2.0),
            ],
            [V2D::from([1.0, 0.0]); 3],
        );
        assert!(sample_vector_field(&[collinear], &params(0.1)).is_empty());
    }

    #[test]
    fn shared_edges_sample_once() {
        let v = [V2D::from([0.0, 1.0]); 3];
        let lower = VectorTriangle::new(
            [
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(1.0, 1.0),
            ],
            v,
        );
        let upper = VectorTriangle::new(
            [
                Point::new(0.0, 0.0),
                Point::new(1.0, 1.0),
                Point::new(0.0, 1.0),
            ],
            v,
        );

        let samples = sample_vector_field(&[lower, upper], &params(0.125));
        let positions: HashSet<(u64, u64)> = samples
            .iter()
            .map(|s| (s.position.x.to_bits(), s.position.y.to_bits()))
            .collect();
        assert_eq!(positions.len(), samples.len());

        for s in samples {
            assert!(lower.contains(&s.position) || upper.contains(&s.position));
        }
    }

    #[test]
    fn no_samples_outside_triangles() {
        let tri = right_triangle([V2D::from([1.0, 0.0]); 3]);
        let gs = 0.07;

        let samples = sample_vector_field(&[tri], &params(gs));
        for s in samples.iter() {
            let p = s.position;
            assert!(p.x >= 0.0 && p.y >= 0.0 && p.x + p.y <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn proportional_lengths() {
        let tri = right_triangle([V2D::from([0.0, 1.0]); 3]);
        let mut p = params(0.25);
        p.proportional = true;
        p.range = ValueRange::new(0.0, 2.0);

        let samples = sample_vector_field(&[tri], &p);
        assert!(samples
            .iter()
            .all(|s| (s.proportional.unwrap() - 0.5).abs() < 1e-12));

        p.range = ValueRange::new(1.0, 1.0);
        let samples = sample_vector_field(&[tri], &p);
        assert!(samples.iter().all(|s| s.proportional.is_none()));
    }

    #[test]
    fn proportional_lengths_are_clamped() {
        // the x-component changes sign inside the triangle: 1 - 2x + y
        let tri = right_triangle([
            V2D::from([1.0, 0.0]),
            V2D::from([-1.0, 0.0]),
            V2D::from([2.0, 0.0]),
        ]);
        let mut p = params(0.25);
        p.proportional = true;
        p.range = magnitude_range(&[tri]);
        assert_eq!(p.range, ValueRange::new(1.0, 2.0));

        let samples = sample_vector_field(&[tri], &p);
        assert!(samples.iter().any(|s| s.magnitude < 1.0));
        for s in samples.iter() {
            let prop = s.proportional.unwrap();
            assert!((0.0..=1.0).contains(&prop));
            if s.magnitude < 1.0 {
                assert_eq!(prop, 0.0);
            }
        }
    }

    #[test]
    fn invalid_grid_step() {
        let tri = right_triangle([V2D::from([1.0, 0.0]); 3]);
        assert!(sample_vector_field(&[tri], &params(0.0)).is_empty());
        assert!(sample_vector_field(&[tri], &params(f64::NAN)).is_empty());
    }

    #[test]
    fn components_and_magnitudes() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
        ];
        let x = SampledField {
            triangles: vec![RenderTriangle::new(points, [3.0, 0.0, 1.0])],
            range: ValueRange::new(0.0, 3.0),
        };
        let y = SampledField {
            triangles: vec![RenderTriangle::new(points, [4.0, 0.5, 0.0])],
            range: ValueRange::new(0.0, 4.0),
        };

        let zipped = zip_components(&x, &y);
        assert_eq!(zipped.len(), 1);
        assert_eq!(zipped[0].vectors[0], V2D::from([3.0, 4.0]));
        assert_eq!(magnitude_range(&zipped), ValueRange::new(0.5, 5.0));

        let scene = BoundingBox::new(Point::new(0.0, 0.0), Point::new(3.0, 1.0));
        assert!((grid_step(&scene, 40) - 0.1).abs() < 1e-15);
    }
}
