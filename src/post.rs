/// Color bar ticks, labels and texture span
pub mod colorbar;
/// Iso-value levels, iso-lines and filled iso-bands
pub mod contour;
/// Color ramps and discretized lookup tables
pub mod palette;
/// Patch subdivision into render triangles
pub mod patch;
/// Vector glyph sampling over a triangulated vector field
pub mod vectors;

/// Absolute threshold below which a value range (or a value) is treated as zero
pub const EPS_ZERO: f64 = 1e-10;
