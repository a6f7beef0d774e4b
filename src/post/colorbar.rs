use super::palette::LookupTable;
use super::patch::ValueRange;
use super::EPS_ZERO;

/// Number of labeled ticks along a color bar
pub const NUM_TICKS: usize = 11;

/// Distribution of tick values along the bar
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickScale {
    Linear,
    /// Ticks bunch towards `min`, following `(base^t - 1) / (base - 1)`
    Log { base: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColorBarTick {
    pub value: f64,
    pub label: String,
}

/// Everything a renderer needs to draw the legend of the scalar view
#[derive(Clone, Debug, PartialEq)]
pub struct ColorBar {
    /// Ticks from bottom (`min`) to top (`max`)
    pub ticks: Vec<ColorBarTick>,
    /// `"short_name (unit)"`, or empty when no variable is shown
    pub title: String,
    /// Texture coordinate at the bottom of the bar
    pub texture_bottom: f64,
    /// Texture coordinate at the top of the bar
    pub texture_top: f64,
}

impl ColorBar {
    pub fn new(
        range: &ValueRange,
        table: &LookupTable,
        scale: TickScale,
        decimal_places: usize,
        variable: Option<(&str, &str)>,
    ) -> Self {
        let ticks = tick_values(range, scale)
            .into_iter()
            .map(|value| ColorBarTick {
                value,
                label: tick_label(value, decimal_places),
            })
            .collect();

        let texture_top = if range.is_degenerate() {
            table.shift
        } else {
            table.scale + table.shift
        };

        Self {
            ticks,
            title: variable
                .map(|(short_name, unit)| format!("{} ({})", short_name, unit))
                .unwrap_or_default(),
            texture_bottom: table.shift,
            texture_top,
        }
    }
}

/// The `NUM_TICKS` tick values of a color bar spanning `range`
pub fn tick_values(range: &ValueRange, scale: TickScale) -> Vec<f64> {
    (0..NUM_TICKS)
        .map(|i| {
            let t = i as f64 / (NUM_TICKS - 1) as f64;
            let fraction = match scale {
                TickScale::Log { base } if base > 0.0 && (base - 1.0).abs() > EPS_ZERO => {
                    (base.powf(t) - 1.0) / (base - 1.0)
                }
                _ => t,
            };
            let value = range.min + fraction * range.span();

            if value.abs() < EPS_ZERO {
                0.0
            } else {
                value
            }
        })
        .collect()
}

/// Exponent notation with `decimal_places` mantissa digits and a signed, two-digit exponent (`-1.50e+03`)
pub fn tick_label(value: f64, decimal_places: usize) -> String {
    let value = if value.abs() < EPS_ZERO { 0.0 } else { value };
    let formatted = format!("{:.*e}", decimal_places, value);

    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted,
    }
}
