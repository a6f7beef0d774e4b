use super::EPS_ZERO;
use crate::geometry::Point;

use rayon::prelude::*;
use std::fmt;

/// A subdivided (possibly curved) quadrilateral region of a Mesh with attached nodal values
///
/// The patch is divided into an `n_subdivisions` by `n_subdivisions` grid of sub-cells. Grid node `(i1, i2)`
/// (with `i1` running along the local x-direction and `i2` along the local y-direction) is stored at index
/// `i1 + i2 * (n_subdivisions + 1)` in both `values` and `points`.
#[derive(Clone, Debug)]
pub struct Patch {
    /// Corner vertices in local order: `[(0, 0), (1, 0), (0, 1), (1, 1)]`
    pub vertices: [Point; 4],
    pub n_subdivisions: usize,
    pub values: Vec<f64>,
    /// Explicit node locations (curved elements). When absent, node locations are interpolated from `vertices`
    pub points: Option<Vec<Point>>,
}

impl Patch {
    /// Construct a patch whose node locations are bilinearly interpolated from its corner vertices
    pub fn linear(vertices: [Point; 4], n_subdivisions: usize, values: Vec<f64>) -> Self {
        Self {
            vertices,
            n_subdivisions,
            values,
            points: None,
        }
    }

    /// Construct a patch with explicitly stored node locations
    pub fn curved(
        vertices: [Point; 4],
        n_subdivisions: usize,
        values: Vec<f64>,
        points: Vec<Point>,
    ) -> Self {
        Self {
            vertices,
            n_subdivisions,
            values,
            points: Some(points),
        }
    }

    /// Number of grid nodes along each side of the patch
    pub fn points_per_side(&self) -> usize {
        self.n_subdivisions + 1
    }

    /// Number of [RenderTriangle]s this patch produces when sampled
    pub fn num_triangles(&self) -> usize {
        2 * self.n_subdivisions * self.n_subdivisions
    }

    /// Location of grid node `(xstep, ystep)`
    pub fn node(&self, xstep: usize, ystep: usize) -> Point {
        match &self.points {
            Some(points) => points[xstep + ystep * self.points_per_side()],
            None => {
                let step_size = 1.0 / self.n_subdivisions as f64;
                let xfrac = xstep as f64 * step_size;
                let yfrac = ystep as f64 * step_size;

                (self.vertices[1] * xfrac + self.vertices[0] * (1.0 - xfrac)) * (1.0 - yfrac)
                    + (self.vertices[3] * xfrac + self.vertices[2] * (1.0 - xfrac)) * yfrac
            }
        }
    }

    /// Field value at grid node `(xstep, ystep)`
    pub fn value(&self, xstep: usize, ystep: usize) -> f64 {
        self.values[xstep + ystep * self.points_per_side()]
    }

    fn assert_well_formed(&self) {
        assert!(
            self.n_subdivisions > 0,
            "Patch has zero subdivisions; Cannot sample Patch!"
        );

        let expected = self.points_per_side() * self.points_per_side();
        assert_eq!(
            self.values.len(),
            expected,
            "Patch with {} subdivisions must carry {} values; Cannot sample Patch!",
            self.n_subdivisions,
            expected,
        );

        if let Some(points) = &self.points {
            assert_eq!(
                points.len(),
                expected,
                "Patch with {} subdivisions must carry {} node points; Cannot sample Patch!",
                self.n_subdivisions,
                expected,
            );
        }
    }
}

/// A flat shaded triangle: three points with one scalar value each
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderTriangle {
    pub points: [Point; 3],
    pub values: [f64; 3],
}

impl RenderTriangle {
    pub const fn new(points: [Point; 3], values: [f64; 3]) -> Self {
        Self { points, values }
    }

    /// Twice the signed area (positive for counter-clockwise vertex order)
    pub fn area2(&self) -> f64 {
        let [a, b, c] = self.points;
        a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y)
    }
}

/// Minimum and maximum of a sampled field
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A range containing no values (`min > max`); including any value makes it non-empty
    pub const fn empty() -> Self {
        Self {
            min: f64::MAX,
            max: -f64::MAX,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Widen the range to include `value` (strict comparisons: ties keep the stored value)
    pub fn include(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// The union of two ranges, with `self` taking precedence on ties
    pub fn merged(mut self, other: Self) -> Self {
        if !other.is_empty() {
            self.include(other.min);
            self.include(other.max);
        }
        self
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// True if the range is too narrow to normalize against
    pub fn is_degenerate(&self) -> bool {
        self.is_empty() || self.span().abs() <= EPS_ZERO
    }

    /// Map `value` into `[0, 1]` relative to this range (unclamped). Degenerate ranges map everything to `0`
    pub fn normalize(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            (value - self.min) / self.span()
        }
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            write!(f, "[empty]")
        } else {
            write!(f, "[{:.6e}, {:.6e}]", self.min, self.max)
        }
    }
}

/// Triangulated scalar field produced by the patch sampler
#[derive(Clone, Debug, Default)]
pub struct SampledField {
    pub triangles: Vec<RenderTriangle>,
    pub range: ValueRange,
}

impl SampledField {
    pub fn empty() -> Self {
        Self {
            triangles: Vec::new(),
            range: ValueRange::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Walk a collection of [Patch]es and produce a flat list of [RenderTriangle]s and the global [ValueRange]
///
/// Each sub-cell with corners `c00 = (i1, i2)`, `c01 = (i1, i2 + 1)`, `c10 = (i1 + 1, i2)` and `c11 = (i1 + 1, i2 + 1)`
/// is split along a fixed diagonal into the triangles `(c00, c01, c10)` and `(c01, c11, c10)`.
///
/// Panics if any patch has zero subdivisions, or carries value/point lists of the wrong length
pub fn sample_patches(patches: &[Patch]) -> SampledField {
    let mut field = SampledField {
        triangles: Vec::with_capacity(patches.iter().map(|p| p.num_triangles()).sum()),
        range: ValueRange::empty(),
    };

    for patch in patches {
        sample_patch(patch, &mut field.triangles, &mut field.range);
    }

    field
}

/// Same as `sample_patches`, except patches are sampled in parallel using the Rayon Global ThreadPool
///
/// Blocks until every patch is sampled. The triangle order and the resulting range are identical to `sample_patches`
pub fn sample_patches_parallel(patches: &[Patch]) -> SampledField {
    let per_patch: Vec<(Vec<RenderTriangle>, ValueRange)> = patches
        .par_iter()
        .map(|patch| {
            let mut triangles = Vec::with_capacity(patch.num_triangles());
            let mut range = ValueRange::empty();
            sample_patch(patch, &mut triangles, &mut range);
            (triangles, range)
        })
        .collect();

    let mut field = SampledField {
        triangles: Vec::with_capacity(per_patch.iter().map(|(t, _)| t.len()).sum()),
        range: ValueRange::empty(),
    };

    for (mut triangles, range) in per_patch {
        field.triangles.append(&mut triangles);
        field.range = field.range.merged(range);
    }

    field
}

fn sample_patch(patch: &Patch, triangles: &mut Vec<RenderTriangle>, range: &mut ValueRange) {
    patch.assert_well_formed();
    let n = patch.points_per_side();

    for i2 in 0..n - 1 {
        for i1 in 0..n - 1 {
            let node0 = patch.node(i1, i2);
            let node1 = patch.node(i1, i2 + 1);
            let node2 = patch.node(i1 + 1, i2);
            let node3 = patch.node(i1 + 1, i2 + 1);

            let value0 = patch.value(i1, i2);
            let value1 = patch.value(i1, i2 + 1);
            let value2 = patch.value(i1 + 1, i2);
            let value3 = patch.value(i1 + 1, i2 + 1);

            for value in [value0, value1, value2, value3] {
                range.include(value);
            }

            triangles.push(RenderTriangle::new(
                [node0, node1, node2],
                [value0, value1, value2],
            ));
            triangles.push(RenderTriangle::new(
                [node1, node3, node2],
                [value1, value3, value2],
            ));
        }
    }
}
