use super::solution::FieldSolutionId;
use crate::post::colorbar::ColorBar;
use crate::post::contour::ContourSet;
use crate::post::patch::{RenderTriangle, SampledField, ValueRange};
use crate::post::vectors::VectorGlyphSample;

/// Triangulated views a frame carries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewKind {
    Scalar,
    Contour,
}

/// Derived data of one completed refresh
///
/// Frames are published behind an `Arc` and never mutated afterwards; a refresh builds a new one.
#[derive(Clone, Debug, Default)]
pub struct PostFrame {
    /// Solution the views were computed from (`None` when no solution was available)
    pub solution: Option<FieldSolutionId>,
    pub scalar: SampledField,
    pub contour: SampledField,
    pub contours: ContourSet,
    pub vectors: Vec<VectorGlyphSample>,
    /// Range of the vertex magnitudes of the vector view
    pub vector_range: ValueRange,
    pub color_bar: Option<ColorBar>,
}

impl PostFrame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.scalar.is_empty() && self.contour.is_empty() && self.vectors.is_empty()
    }

    pub fn triangles(&self, kind: ViewKind) -> &[RenderTriangle] {
        &self.field(kind).triangles
    }

    pub fn range(&self, kind: ViewKind) -> ValueRange {
        self.field(kind).range
    }

    fn field(&self, kind: ViewKind) -> &SampledField {
        match kind {
            ViewKind::Scalar => &self.scalar,
            ViewKind::Contour => &self.contour,
        }
    }
}
