use super::solution::VariableComp;
use crate::post::colorbar::TickScale;
use crate::post::palette::{PaletteStyle, MAX_PALETTE_STEPS};

use json::{object, JsonValue};
use log::warn;
use std::error::Error;
use std::fmt;
use std::fs::read_to_string;

#[cfg(feature = "json_export")]
use std::{fs::File, io::BufWriter};

/// Step count used for the lookup table whenever the palette filter is on
pub const FILTERED_PALETTE_STEPS: usize = 100;

/// Largest accepted number of decimal places on color bar labels
pub const MAX_DECIMAL_PLACES: usize = 16;

/// Post-processing configuration
#[derive(Clone, Debug, PartialEq)]
pub struct PostSettings {
    pub palette_style: PaletteStyle,
    /// Number of discrete colors (1 to 256)
    pub palette_steps: usize,
    /// Smooth interpolation between palette entries
    pub palette_filter: bool,

    pub show_scalar_view: bool,
    pub show_scalar_color_bar: bool,
    pub show_contour_view: bool,
    pub show_vector_view: bool,

    pub contours_count: usize,

    /// Target number of glyphs along the scene's width plus height
    pub vector_count: usize,
    /// Glyph length relative to the grid spacing
    pub vector_scale: f64,
    pub vector_proportional: bool,

    /// Follow the scalar view's value range (written back after each refresh)
    pub scalar_range_auto: bool,
    pub scalar_range_min: f64,
    pub scalar_range_max: f64,
    pub scalar_range_log: bool,
    pub scalar_range_base: f64,
    pub scalar_decimal_places: usize,

    pub scalar_variable: Option<String>,
    pub scalar_component: VariableComp,
    pub contour_variable: Option<String>,
    pub vector_variable: Option<String>,

    /// Subdivisions requested per patch side
    pub patch_subdivisions: usize,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            palette_style: PaletteStyle::default(),
            palette_steps: 30,
            palette_filter: false,
            show_scalar_view: true,
            show_scalar_color_bar: true,
            show_contour_view: false,
            show_vector_view: false,
            contours_count: 15,
            vector_count: 50,
            vector_scale: 0.6,
            vector_proportional: true,
            scalar_range_auto: true,
            scalar_range_min: 0.0,
            scalar_range_max: 1.0,
            scalar_range_log: false,
            scalar_range_base: 10.0,
            scalar_decimal_places: 2,
            scalar_variable: None,
            scalar_component: VariableComp::default(),
            contour_variable: None,
            vector_variable: None,
            patch_subdivisions: 2,
        }
    }
}

impl PostSettings {
    /// Load settings from a JSON file; keys missing from the file keep their default value
    pub fn from_file(path: impl AsRef<str>) -> Result<Self, Box<dyn Error>> {
        let contents = read_to_string(path.as_ref())?;
        let settings_json = json::parse(&contents)?;

        Ok(Self::from_json(&settings_json)?)
    }

    /// Build settings from a parsed JSON object; keys missing from the object keep their default value
    pub fn from_json(settings_json: &JsonValue) -> Result<Self, SettingsError> {
        if !settings_json.is_object() {
            return Err(SettingsError::NotAnObject);
        }

        let mut settings = Self::default();
        let j = settings_json;

        if let Some(name) = parse_str(j, "palette_style")? {
            settings.palette_style = PaletteStyle::from_name(name).unwrap_or_else(|| {
                warn!(
                    "Unknown palette style '{}'; Using '{}' instead!",
                    name,
                    PaletteStyle::default()
                );
                PaletteStyle::default()
            });
        }
        if let Some(comp) = parse_str(j, "scalar_component")? {
            settings.scalar_component = VariableComp::from_name(comp).unwrap_or_else(|| {
                warn!(
                    "Unknown variable component '{}'; Using '{}' instead!",
                    comp,
                    VariableComp::default().name()
                );
                VariableComp::default()
            });
        }

        set_count(j, "palette_steps", &mut settings.palette_steps)?;
        set_count(j, "contours_count", &mut settings.contours_count)?;
        set_count(j, "vector_count", &mut settings.vector_count)?;
        set_count(j, "scalar_decimal_places", &mut settings.scalar_decimal_places)?;
        set_count(j, "patch_subdivisions", &mut settings.patch_subdivisions)?;

        set_number(j, "vector_scale", &mut settings.vector_scale)?;
        set_number(j, "scalar_range_min", &mut settings.scalar_range_min)?;
        set_number(j, "scalar_range_max", &mut settings.scalar_range_max)?;
        set_number(j, "scalar_range_base", &mut settings.scalar_range_base)?;

        set_bool(j, "palette_filter", &mut settings.palette_filter)?;
        set_bool(j, "show_scalar_view", &mut settings.show_scalar_view)?;
        set_bool(j, "show_scalar_color_bar", &mut settings.show_scalar_color_bar)?;
        set_bool(j, "show_contour_view", &mut settings.show_contour_view)?;
        set_bool(j, "show_vector_view", &mut settings.show_vector_view)?;
        set_bool(j, "vector_proportional", &mut settings.vector_proportional)?;
        set_bool(j, "scalar_range_auto", &mut settings.scalar_range_auto)?;
        set_bool(j, "scalar_range_log", &mut settings.scalar_range_log)?;

        settings.scalar_variable = parse_str(j, "scalar_variable")?.map(str::to_owned);
        settings.contour_variable = parse_str(j, "contour_variable")?.map(str::to_owned);
        settings.vector_variable = parse_str(j, "vector_variable")?.map(str::to_owned);

        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> JsonValue {
        let palette_style = self.palette_style.name();
        let scalar_component = self.scalar_component.name();

        object! {
            "palette_style": palette_style,
            "palette_steps": self.palette_steps,
            "palette_filter": self.palette_filter,
            "show_scalar_view": self.show_scalar_view,
            "show_scalar_color_bar": self.show_scalar_color_bar,
            "show_contour_view": self.show_contour_view,
            "show_vector_view": self.show_vector_view,
            "contours_count": self.contours_count,
            "vector_count": self.vector_count,
            "vector_scale": self.vector_scale,
            "vector_proportional": self.vector_proportional,
            "scalar_range_auto": self.scalar_range_auto,
            "scalar_range_min": self.scalar_range_min,
            "scalar_range_max": self.scalar_range_max,
            "scalar_range_log": self.scalar_range_log,
            "scalar_range_base": self.scalar_range_base,
            "scalar_decimal_places": self.scalar_decimal_places,
            "scalar_variable": JsonValue::from(self.scalar_variable.clone()),
            "scalar_component": scalar_component,
            "contour_variable": JsonValue::from(self.contour_variable.clone()),
            "vector_variable": JsonValue::from(self.vector_variable.clone()),
            "patch_subdivisions": self.patch_subdivisions,
        }
    }

    /// Print the settings to a JSON file specified by path.
    #[cfg(feature = "json_export")]
    pub fn export_to_json(&self, path: impl AsRef<str>) -> std::io::Result<()> {
        let f = File::create(path.as_ref())?;
        let mut w = BufWriter::new(&f);

        self.to_json().write_pretty(&mut w, 4)?;

        Ok(())
    }

    /// Check every numeric option against its accepted range
    pub fn validate(&self) -> Result<(), SettingsError> {
        check(
            "palette_steps",
            self.palette_steps as f64,
            (1..=MAX_PALETTE_STEPS).contains(&self.palette_steps),
        )?;
        check(
            "contours_count",
            self.contours_count as f64,
            self.contours_count >= 1,
        )?;
        check(
            "vector_count",
            self.vector_count as f64,
            self.vector_count >= 1,
        )?;
        check(
            "vector_scale",
            self.vector_scale,
            self.vector_scale.is_finite() && self.vector_scale > 0.0,
        )?;
        check(
            "scalar_range_base",
            self.scalar_range_base,
            self.scalar_range_base.is_finite() && self.scalar_range_base > 1.0,
        )?;
        check(
            "scalar_decimal_places",
            self.scalar_decimal_places as f64,
            self.scalar_decimal_places <= MAX_DECIMAL_PLACES,
        )?;
        check(
            "patch_subdivisions",
            self.patch_subdivisions as f64,
            self.patch_subdivisions >= 1,
        )?;
        check(
            "scalar_range_min",
            self.scalar_range_min,
            self.scalar_range_min.is_finite(),
        )?;
        check(
            "scalar_range_max",
            self.scalar_range_max,
            self.scalar_range_max.is_finite()
                && (self.scalar_range_auto || self.scalar_range_max >= self.scalar_range_min),
        )?;

        Ok(())
    }

    /// Number of steps the palette lookup table is actually built with
    pub fn effective_palette_steps(&self) -> usize {
        if self.palette_filter {
            FILTERED_PALETTE_STEPS
        } else {
            self.palette_steps
        }
    }

    pub fn tick_scale(&self) -> TickScale {
        if self.scalar_range_log {
            TickScale::Log {
                base: self.scalar_range_base,
            }
        } else {
            TickScale::Linear
        }
    }
}

/// The Error Type for invalid post-processing settings
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    NotAnObject,
    WrongType(&'static str, &'static str),
    OutOfRange(&'static str, f64),
}

impl Error for SettingsError {}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotAnObject => {
                write!(f, "Settings must be a JSON Object; Cannot load PostSettings!")
            }
            Self::WrongType(key, expected) => write!(
                f,
                "'{}' must be {}; Cannot load PostSettings!",
                key, expected
            ),
            Self::OutOfRange(key, value) => write!(
                f,
                "'{}' is out of range ({}); Cannot load PostSettings!",
                key, value
            ),
        }
    }
}

fn check(key: &'static str, value: f64, valid: bool) -> Result<(), SettingsError> {
    if valid {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange(key, value))
    }
}

fn parse_str<'a>(j: &'a JsonValue, key: &'static str) -> Result<Option<&'a str>, SettingsError> {
    let value = &j[key];
    if value.is_null() {
        Ok(None)
    } else {
        value
            .as_str()
            .map(Some)
            .ok_or(SettingsError::WrongType(key, "a string"))
    }
}

fn set_bool(j: &JsonValue, key: &'static str, target: &mut bool) -> Result<(), SettingsError> {
    let value = &j[key];
    if !value.is_null() {
        *target = value
            .as_bool()
            .ok_or(SettingsError::WrongType(key, "a boolean"))?;
    }
    Ok(())
}

fn set_number(j: &JsonValue, key: &'static str, target: &mut f64) -> Result<(), SettingsError> {
    let value = &j[key];
    if !value.is_null() {
        *target = value
            .as_f64()
            .ok_or(SettingsError::WrongType(key, "a number"))?;
    }
    Ok(())
}

fn set_count(j: &JsonValue, key: &'static str, target: &mut usize) -> Result<(), SettingsError> {
    let mut number = 0.0;
    if j[key].is_null() {
        return Ok(());
    }
    set_number(j, key, &mut number)?;

    if number < 0.0 || number.fract() != 0.0 || !number.is_finite() {
        return Err(SettingsError::OutOfRange(key, number));
    }
    *target = number as usize;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = PostSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.palette_style, PaletteStyle::Agros2D);
        assert_eq!(settings.effective_palette_steps(), 30);
        assert_eq!(settings.tick_scale(), TickScale::Linear);
    }

    #[test]
    fn load_settings_file() {
        let settings = PostSettings::from_file("./test_input/post_settings.json").unwrap();

        assert_eq!(settings.palette_style, PaletteStyle::Copper);
        assert_eq!(settings.palette_steps, 64);
        assert!(settings.palette_filter);
        assert_eq!(settings.effective_palette_steps(), FILTERED_PALETTE_STEPS);
        assert!(settings.show_contour_view && settings.show_vector_view);
        assert_eq!(settings.contours_count, 20);
        assert_eq!(settings.vector_count, 40);
        assert_eq!(settings.vector_scale, 0.8);
        assert_eq!(settings.scalar_variable.as_deref(), Some("magnetic_flux_density"));
        assert_eq!(settings.scalar_component, VariableComp::Magnitude);
        assert_eq!(settings.contour_variable, None);
        assert_eq!(
            settings.tick_scale(),
            TickScale::Log { base: 2.0 }
        );

        // not present in the file
        assert_eq!(settings.scalar_decimal_places, 2);
        assert_eq!(settings.patch_subdivisions, 2);
    }

    #[test]
    fn unknown_names_fall_back() {
        let settings = PostSettings::from_json(&object! {
            "palette_style": "sunset",
            "scalar_component": "z",
        })
        .unwrap();

        assert_eq!(settings.palette_style, PaletteStyle::default());
        assert_eq!(settings.scalar_component, VariableComp::Scalar);
    }

    #[test]
    fn invalid_settings() {
        let bad = PostSettings::from_file("./test_input/post_settings_bad.json");
        assert!(bad.is_err());

        assert_eq!(
            PostSettings::from_json(&object! { "palette_steps": 300 }),
            Err(SettingsError::OutOfRange("palette_steps", 300.0))
        );
        assert_eq!(
            PostSettings::from_json(&object! { "contours_count": 2.5 }),
            Err(SettingsError::OutOfRange("contours_count", 2.5))
        );
        assert_eq!(
            PostSettings::from_json(&object! { "vector_proportional": "yes" }),
            Err(SettingsError::WrongType("vector_proportional", "a boolean"))
        );
        assert_eq!(
            PostSettings::from_json(&JsonValue::from(5)),
            Err(SettingsError::NotAnObject)
        );
        assert!(PostSettings::from_file("./test_input/does_not_exist.json").is_err());
    }

    #[cfg(feature = "json_export")]
    #[test]
    fn export_and_reload() {
        let mut settings = PostSettings::default();
        settings.palette_style = PaletteStyle::Hot;
        settings.vector_variable = Some("current_density".to_owned());
        settings.scalar_range_min = -2.5;

        let path = std::env::temp_dir().join("fem_2d_post_settings_export.json");
        let path = path.to_string_lossy();
        settings.export_to_json(&*path).unwrap();

        assert_eq!(PostSettings::from_file(&*path).unwrap(), settings);
    }
}
