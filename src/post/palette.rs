use super::patch::ValueRange;

use log::warn;
use std::fmt;

/// Number of discrete steps in every named ramp. Ramps hold `PALETTE_ENTRIES + 1` entries so that `x = 1.0` maps
/// onto the final entry
pub const PALETTE_ENTRIES: usize = 256;

/// Number of entries in a [LookupTable]
pub const LOOKUP_TABLE_SIZE: usize = 256;

/// Maximum number of discretization steps in a [LookupTable]
pub const MAX_PALETTE_STEPS: usize = LOOKUP_TABLE_SIZE;

/// Selectable color ramps
///
/// The first twelve are named ramps read from discrete tables, the two grayscale ramps are evaluated analytically
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaletteStyle {
    Agros2D,
    Jet,
    Copper,
    Hot,
    Cool,
    Bone,
    Pink,
    Spring,
    Summer,
    Autumn,
    Winter,
    Hsv,
    /// black to white
    BWAsc,
    /// white to black
    BWDesc,
}

impl PaletteStyle {
    pub const ALL: [Self; 14] = [
        Self::Agros2D,
        Self::Jet,
        Self::Copper,
        Self::Hot,
        Self::Cool,
        Self::Bone,
        Self::Pink,
        Self::Spring,
        Self::Summer,
        Self::Autumn,
        Self::Winter,
        Self::Hsv,
        Self::BWAsc,
        Self::BWDesc,
    ];

    /// Numeric selector used by external setting stores
    pub fn id(&self) -> i64 {
        match self {
            Self::Agros2D => 0,
            Self::Jet => 1,
            Self::Copper => 2,
            Self::Hot => 3,
            Self::Cool => 4,
            Self::Bone => 5,
            Self::Pink => 6,
            Self::Spring => 7,
            Self::Summer => 8,
            Self::Autumn => 9,
            Self::Winter => 10,
            Self::Hsv => 11,
            Self::BWAsc => 12,
            Self::BWDesc => 13,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|style| style.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Agros2D => "agros2d",
            Self::Jet => "jet",
            Self::Copper => "copper",
            Self::Hot => "hot",
            Self::Cool => "cool",
            Self::Bone => "bone",
            Self::Pink => "pink",
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Autumn => "autumn",
            Self::Winter => "winter",
            Self::Hsv => "hsv",
            Self::BWAsc => "bw_ascending",
            Self::BWDesc => "bw_descending",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|style| style.name() == name)
    }

    /// True for the two analytically computed grayscale ramps
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::BWAsc | Self::BWDesc)
    }
}

impl Default for PaletteStyle {
    fn default() -> Self {
        Self::Agros2D
    }
}

impl fmt::Display for PaletteStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// RGB color with channels in `[0, 1]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(level: f64) -> Self {
        Self::new(level, level, level)
    }

    /// 8-bit channels (truncating `channel * 255`)
    pub fn to_bytes(&self) -> [u8; 3] {
        [
            (self.r * 255.0) as u8,
            (self.g * 255.0) as u8,
            (self.b * 255.0) as u8,
        ]
    }
}

/// Map `x` to a color on the `style` ramp
///
/// `x` is clamped to `[0, 1]`. Named ramps return their discrete entry `floor(x * PALETTE_ENTRIES)`;
/// the grayscale ramps return `x` (or `1 - x`) directly.
pub fn color_at(style: PaletteStyle, x: f64) -> Rgb {
    let x = x.clamp(0.0, 1.0);

    match style {
        PaletteStyle::BWAsc => Rgb::gray(x),
        PaletteStyle::BWDesc => Rgb::gray(1.0 - x),
        named => ramp_entry(named, (x * PALETTE_ENTRIES as f64).floor() as usize),
    }
}

/// Same as `color_at`, with the ramp given by its numeric selector
///
/// Unknown selectors are a configuration error: a warning is logged and no color is returned
pub fn color_at_id(style_id: i64, x: f64) -> Option<Rgb> {
    match PaletteStyle::from_id(style_id) {
        Some(style) => Some(color_at(style, x)),
        None => {
            warn!("Undefined palette style: {}; Cannot compute color!", style_id);
            None
        }
    }
}

/// Discrete entry `n` (`0..=PALETTE_ENTRIES`) of a ramp
pub fn ramp_entry(style: PaletteStyle, n: usize) -> Rgb {
    assert!(
        n <= PALETTE_ENTRIES,
        "Palette entry {} is out of range (max: {})!",
        n,
        PALETTE_ENTRIES
    );

    ramp(style, n as f64 / PALETTE_ENTRIES as f64)
}

/// All `PALETTE_ENTRIES + 1` discrete entries of a ramp
pub fn ramp_table(style: PaletteStyle) -> Vec<Rgb> {
    (0..=PALETTE_ENTRIES).map(|n| ramp_entry(style, n)).collect()
}

// continuous definition of each ramp over t in [0, 1]
fn ramp(style: PaletteStyle, t: f64) -> Rgb {
    match style {
        PaletteStyle::Agros2D => Rgb::new(
            piecewise(&AGROS2D_R, t),
            piecewise(&AGROS2D_G, t),
            piecewise(&AGROS2D_B, t),
        ),
        PaletteStyle::Jet => Rgb::new(
            piecewise(&JET_R, t),
            piecewise(&JET_G, t),
            piecewise(&JET_B, t),
        ),
        PaletteStyle::Copper => Rgb::new((1.25 * t).min(1.0), 0.7812 * t, 0.4975 * t),
        PaletteStyle::Hot => Rgb::new(
            piecewise(&HOT_R, t),
            piecewise(&HOT_G, t),
            piecewise(&HOT_B, t),
        ),
        PaletteStyle::Cool => Rgb::new(t, 1.0 - t, 1.0),
        PaletteStyle::Bone => Rgb::new(
            piecewise(&BONE_R, t),
            piecewise(&BONE_G, t),
            piecewise(&BONE_B, t),
        ),
        PaletteStyle::Pink => {
            let hot = ramp(PaletteStyle::Hot, t);
            Rgb::new(
                ((2.0 * t + hot.r) / 3.0).sqrt(),
                ((2.0 * t + hot.g) / 3.0).sqrt(),
                ((2.0 * t + hot.b) / 3.0).sqrt(),
            )
        }
        PaletteStyle::Spring => Rgb::new(1.0, t, 1.0 - t),
        PaletteStyle::Summer => Rgb::new(t, 0.5 + 0.5 * t, 0.4),
        PaletteStyle::Autumn => Rgb::new(1.0, t, 0.0),
        PaletteStyle::Winter => Rgb::new(0.0, t, 1.0 - 0.5 * t),
        PaletteStyle::Hsv => hue_to_rgb(t),
        PaletteStyle::BWAsc => Rgb::gray(t),
        PaletteStyle::BWDesc => Rgb::gray(1.0 - t),
    }
}

// (t, channel) control points
const AGROS2D_R: [(f64, f64); 5] = [
    (0.0, 0.17),
    (0.25, 0.0),
    (0.5, 0.0),
    (0.75, 1.0),
    (1.0, 0.8),
];
const AGROS2D_G: [(f64, f64); 5] = [
    (0.0, 0.0),
    (0.25, 0.45),
    (0.5, 0.85),
    (0.75, 0.85),
    (1.0, 0.05),
];
const AGROS2D_B: [(f64, f64); 5] = [
    (0.0, 0.55),
    (0.25, 1.0),
    (0.5, 0.4),
    (0.75, 0.0),
    (1.0, 0.0),
];

const JET_R: [(f64, f64); 5] = [
    (0.0, 0.0),
    (0.35, 0.0),
    (0.66, 1.0),
    (0.89, 1.0),
    (1.0, 0.5),
];
const JET_G: [(f64, f64); 6] = [
    (0.0, 0.0),
    (0.125, 0.0),
    (0.375, 1.0),
    (0.64, 1.0),
    (0.91, 0.0),
    (1.0, 0.0),
];
const JET_B: [(f64, f64); 5] = [
    (0.0, 0.5),
    (0.11, 1.0),
    (0.34, 1.0),
    (0.65, 0.0),
    (1.0, 0.0),
];

const HOT_R: [(f64, f64); 3] = [(0.0, 0.0416), (0.365079, 1.0), (1.0, 1.0)];
const HOT_G: [(f64, f64); 4] = [(0.0, 0.0), (0.365079, 0.0), (0.746032, 1.0), (1.0, 1.0)];
const HOT_B: [(f64, f64); 3] = [(0.0, 0.0), (0.746032, 0.0), (1.0, 1.0)];

const BONE_R: [(f64, f64); 3] = [(0.0, 0.0), (0.746032, 0.652778), (1.0, 1.0)];
const BONE_G: [(f64, f64); 4] = [
    (0.0, 0.0),
    (0.365079, 0.319444),
    (0.746032, 0.777778),
    (1.0, 1.0),
];
const BONE_B: [(f64, f64); 3] = [(0.0, 0.0), (0.365079, 0.444444), (1.0, 1.0)];

fn piecewise(points: &[(f64, f64)], t: f64) -> f64 {
    let (t_first, v_first) = points[0];
    if t <= t_first {
        return v_first;
    }

    for pair in points.windows(2) {
        let [(t0, v0), (t1, v1)] = [pair[0], pair[1]];
        if t <= t1 {
            return v0 + (v1 - v0) * (t - t0) / (t1 - t0);
        }
    }

    points[points.len() - 1].1
}

// full saturation and value, hue in [0, 1] (both ends are red)
fn hue_to_rgb(hue: f64) -> Rgb {
    let h = hue * 6.0;
    let sector = h.floor();
    let f = h - sector;

    match (sector as usize) % 6 {
        0 => Rgb::new(1.0, f, 0.0),
        1 => Rgb::new(1.0 - f, 1.0, 0.0),
        2 => Rgb::new(0.0, 1.0, f),
        3 => Rgb::new(0.0, 1.0 - f, 1.0),
        4 => Rgb::new(f, 0.0, 1.0),
        _ => Rgb::new(1.0, 0.0, 1.0 - f),
    }
}

/// Discretized color table for backend upload
///
/// A pure function of (style, step count, filter flag).
#[derive(Clone, Debug, PartialEq)]
pub struct LookupTable {
    pub colors: [[u8; 3]; LOOKUP_TABLE_SIZE],
    /// Texture coordinate scale the consumer applies to normalized values
    pub scale: f64,
    /// Texture coordinate offset the consumer applies after scaling
    pub shift: f64,
    style: PaletteStyle,
    step_count: usize,
    filter: bool,
}

impl LookupTable {
    /// Sample `step_count` evenly spaced colors of `style` and pad the rest of the table with the last sampled color
    ///
    /// With `filter` enabled (smooth interpolation in the consumer) the texture span is shrunk by one step and shifted
    /// by half an entry so that lookups never blend into the padding
    pub fn build(
        style: PaletteStyle,
        step_count: usize,
        filter: bool,
    ) -> Result<Self, PaletteError> {
        if step_count == 0 || step_count > MAX_PALETTE_STEPS {
            return Err(PaletteError::InvalidStepCount(step_count));
        }

        let mut colors = [[0_u8; 3]; LOOKUP_TABLE_SIZE];
        for (i, entry) in colors.iter_mut().enumerate().take(step_count) {
            *entry = color_at(style, i as f64 / step_count as f64).to_bytes();
        }
        let last = colors[step_count - 1];
        for entry in colors.iter_mut().skip(step_count) {
            *entry = last;
        }

        let (scale, shift) = if filter {
            (
                (step_count - 1) as f64 / LOOKUP_TABLE_SIZE as f64,
                0.5 / LOOKUP_TABLE_SIZE as f64,
            )
        } else {
            (step_count as f64 / LOOKUP_TABLE_SIZE as f64, 0.0)
        };

        Ok(Self {
            colors,
            scale,
            shift,
            style,
            step_count,
            filter,
        })
    }

    pub fn style(&self) -> PaletteStyle {
        self.style
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn filter(&self) -> bool {
        self.filter
    }

    /// True if this table was built from exactly these parameters
    pub fn matches(&self, style: PaletteStyle, step_count: usize, filter: bool) -> bool {
        self.style == style && self.step_count == step_count && self.filter == filter
    }

    /// 1D texture coordinate of `value` relative to `range`
    pub fn texture_coord(&self, value: f64, range: &ValueRange) -> f64 {
        range.normalize(value).clamp(0.0, 1.0) * self.scale + self.shift
    }

    /// Table flattened into `LOOKUP_TABLE_SIZE * 3` bytes (RGB triplets)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.colors.iter().flatten().copied().collect()
    }
}

/// The Error Type for invalid palette requests
#[derive(Debug, Clone, PartialEq)]
pub enum PaletteError {
    InvalidStepCount(usize),
}

impl std::error::Error for PaletteError {}

impl fmt::Display for PaletteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidStepCount(steps) => write!(
                f,
                "Palette step count must be within [1, {}] (got {}); Cannot build Lookup Table!",
                MAX_PALETTE_STEPS, steps
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_at_endpoints() {
        for style in PaletteStyle::ALL {
            let table = ramp_table(style);
            assert_eq!(table.len(), PALETTE_ENTRIES + 1);
            assert_eq!(color_at(style, 0.0), table[0], "{}", style);
            assert_eq!(color_at(style, 1.0), table[PALETTE_ENTRIES], "{}", style);
        }
    }

    #[test]
    fn color_at_clamps() {
        for style in PaletteStyle::ALL {
            assert_eq!(color_at(style, -5.0), color_at(style, 0.0));
            assert_eq!(color_at(style, 12.0), color_at(style, 1.0));
        }
    }

    #[test]
    fn channels_within_unit_interval() {
        for style in PaletteStyle::ALL {
            for color in ramp_table(style) {
                for c in [color.r, color.g, color.b] {
                    assert!((0.0..=1.0).contains(&c), "{}: {:?}", style, color);
                }
            }
        }
    }

    #[test]
    fn grayscale_ramps() {
        assert_eq!(color_at(PaletteStyle::BWAsc, 0.3), Rgb::gray(0.3));
        assert_eq!(color_at(PaletteStyle::BWDesc, 0.25), Rgb::gray(0.75));
        assert_eq!(color_at(PaletteStyle::BWDesc, 0.0), Rgb::gray(1.0));
    }

    #[test]
    fn named_ramps_are_discrete() {
        // values within the same 1/256 step share an entry
        let a = color_at(PaletteStyle::Jet, 0.5);
        let b = color_at(PaletteStyle::Jet, 0.5 + 0.9 / PALETTE_ENTRIES as f64);
        assert_eq!(a, b);
        assert_eq!(a, ramp_entry(PaletteStyle::Jet, 128));
    }

    #[test]
    fn unknown_style_id() {
        assert!(color_at_id(42, 0.5).is_none());
        assert!(color_at_id(-1, 0.5).is_none());
        assert_eq!(color_at_id(3, 0.5), Some(color_at(PaletteStyle::Hot, 0.5)));
    }

    #[test]
    fn style_ids_and_names() {
        for style in PaletteStyle::ALL {
            assert_eq!(PaletteStyle::from_id(style.id()), Some(style));
            assert_eq!(PaletteStyle::from_name(style.name()), Some(style));
        }
        assert_eq!(PaletteStyle::from_name("viridis"), None);
        assert_eq!(
            PaletteStyle::ALL.iter().filter(|s| s.is_synthetic()).count(),
            2
        );
    }

    #[test]
    fn full_table_scale_and_shift() {
        let lut = LookupTable::build(PaletteStyle::Jet, 256, false).unwrap();
        assert_eq!(lut.scale, 1.0);
        assert_eq!(lut.shift, 0.0);

        let filtered = LookupTable::build(PaletteStyle::Jet, 100, true).unwrap();
        assert!((filtered.scale - 99.0 / 256.0).abs() < 1e-15);
        assert!((filtered.shift - 0.5 / 256.0).abs() < 1e-15);
    }

    #[test]
    fn table_padding_repeats_last_step() {
        for steps in [1, 7, 30, 100, 255] {
            let lut = LookupTable::build(PaletteStyle::Hot, steps, false).unwrap();
            let last = lut.colors[steps - 1];
            assert!(lut.colors[steps..].iter().all(|c| *c == last));
            assert_eq!(
                last,
                color_at(PaletteStyle::Hot, (steps - 1) as f64 / steps as f64).to_bytes()
            );
        }
    }

    #[test]
    fn table_build_is_pure() {
        for style in PaletteStyle::ALL {
            let a = LookupTable::build(style, 30, true).unwrap();
            let b = LookupTable::build(style, 30, true).unwrap();
            assert_eq!(a.to_bytes(), b.to_bytes());
            assert_eq!(a, b);
            assert!(a.matches(style, 30, true));
            assert!(!a.matches(style, 30, false));
        }
    }

    #[test]
    fn invalid_step_counts() {
        assert_eq!(
            LookupTable::build(PaletteStyle::Jet, 0, false),
            Err(PaletteError::InvalidStepCount(0))
        );
        assert!(LookupTable::build(PaletteStyle::Jet, 257, false).is_err());
    }

    #[test]
    fn texture_coordinates() {
        let lut = LookupTable::build(PaletteStyle::Agros2D, 128, false).unwrap();
        let range = ValueRange::new(0.0, 10.0);

        assert_eq!(lut.texture_coord(0.0, &range), 0.0);
        assert!((lut.texture_coord(10.0, &range) - 0.5).abs() < 1e-15);
        assert!((lut.texture_coord(20.0, &range) - 0.5).abs() < 1e-15);
        assert_eq!(lut.to_bytes().len(), 3 * LOOKUP_TABLE_SIZE);
    }
}
