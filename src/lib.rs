/// Points, vectors and bounding boxes in 2D real space
pub mod geometry;
/// Conversion of sampled field solutions into renderable primitives
pub mod post;
/// Active view selection, configuration and cached derived views
pub mod view;

/// Re-exports of the commonly used types and functions
pub mod prelude {
    pub use crate::geometry::{BoundingBox, Point, V2D};

    pub use crate::post::colorbar::{ColorBar, ColorBarTick, TickScale, NUM_TICKS};
    pub use crate::post::contour::{extract_contours, ContourSet, IsoBand, IsoSegment};
    pub use crate::post::palette::{
        color_at, color_at_id, LookupTable, PaletteError, PaletteStyle, Rgb, LOOKUP_TABLE_SIZE,
    };
    pub use crate::post::patch::{
        sample_patches, sample_patches_parallel, Patch, RenderTriangle, SampledField, ValueRange,
    };
    pub use crate::post::vectors::{
        sample_vector_field, GlyphParams, VectorGlyphSample, VectorTriangle,
    };
    pub use crate::post::EPS_ZERO;

    pub use crate::view::controller::{ActiveViewSelection, PostEvent, ViewController};
    pub use crate::view::frame::{PostFrame, ViewKind};
    pub use crate::view::settings::{PostSettings, SettingsError};
    pub use crate::view::solution::{
        FieldId, FieldSolutionId, SolutionMode, SolutionSampler, VariableComp, VariableInfo,
        VariableKind,
    };
}
