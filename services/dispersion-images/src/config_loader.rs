//! Configuration loader for the dispersion image builder.
//!
//! Loads a single YAML file describing:
//! - the input grid and the layers to render
//! - the output directory
//! - image options (scale, opacity, background, GeoTIFF exports)
//! - the color schemes used for each time series
//!
//! Supports environment variable substitution using ${VAR} syntax.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use dispersion_common::TimeSeriesType;
use dispersion_grid::RowOrderSetting;

use crate::image_set::GeotiffExports;

// ============================================================================
// File schema
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispersionImagesFile {
    pub input: InputSection,
    pub output: OutputSection,
    #[serde(default)]
    pub images: ImagesSection,
    #[serde(default)]
    pub series: SeriesSection,
    /// Per-parameter replacements of `series` entries, keyed by upper-case
    /// parameter name
    #[serde(default)]
    pub parameter_overrides: HashMap<String, SeriesSection>,
    #[serde(default)]
    pub schemes: BTreeMap<String, SchemeSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSection {
    pub filename: String,
    pub parameter: String,
    #[serde(default = "default_layers")]
    pub layers: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    pub directory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesSection {
    #[serde(default = "default_utc_offsets")]
    pub daily_utc_offsets: Vec<i32>,
    #[serde(default = "default_scale")]
    pub scale: usize,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub row_order: RowOrderSetting,
    #[serde(default)]
    pub contour_lines: bool,
    #[serde(default = "default_background")]
    pub background_color: ColorSpec,
    /// Background for visual range parameters; falls back to `background_color`
    #[serde(default)]
    pub background_color_visual_range: Option<ColorSpec>,
    #[serde(default)]
    pub geotiff: GeotiffExports,
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            daily_utc_offsets: default_utc_offsets(),
            scale: default_scale(),
            opacity: default_opacity(),
            row_order: RowOrderSetting::default(),
            contour_lines: false,
            background_color: default_background(),
            background_color_visual_range: None,
            geotiff: GeotiffExports::default(),
        }
    }
}

/// One color, given either as `rgb: [r, g, b]` or `hex: "#RRGGBB"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpec {
    Rgb([i64; 3]),
    Hex(String),
}

/// Scheme names for each series type.
///
/// Daily maximum and minimum fall back to the hourly list when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSection {
    #[serde(default)]
    pub hourly: Option<Vec<String>>,
    #[serde(default)]
    pub three_hour: Option<Vec<String>>,
    #[serde(default)]
    pub daily_maximum: Option<Vec<String>>,
    #[serde(default)]
    pub daily_minimum: Option<Vec<String>>,
    #[serde(default)]
    pub daily_average: Option<Vec<String>>,
}

impl SeriesSection {
    pub fn get(&self, series: TimeSeriesType) -> Option<&Vec<String>> {
        match series {
            TimeSeriesType::Hourly => self.hourly.as_ref(),
            TimeSeriesType::ThreeHour => self.three_hour.as_ref(),
            TimeSeriesType::DailyMaximum => self.daily_maximum.as_ref(),
            TimeSeriesType::DailyMinimum => self.daily_minimum.as_ref(),
            TimeSeriesType::DailyAverage => self.daily_average.as_ref(),
        }
    }

    fn names(&self) -> impl Iterator<Item = &String> {
        TimeSeriesType::ALL
            .into_iter()
            .filter_map(|t| self.get(t))
            .flatten()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeSection {
    pub colors: SchemeColors,
    #[serde(default)]
    pub levels: Vec<f64>,
    /// Breakpoints used instead of `levels` for percent parameters
    #[serde(default)]
    pub percent_levels: Option<Vec<f64>>,
    /// Overrides `images.opacity` for this scheme
    #[serde(default)]
    pub opacity: Option<f64>,
}

/// Scheme colors, as parallel channel lists or hex strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeColors {
    Rgb(RgbChannels),
    Hex(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RgbChannels {
    pub red: Vec<i64>,
    pub green: Vec<i64>,
    pub blue: Vec<i64>,
}

fn default_layers() -> Vec<usize> {
    vec![0]
}

fn default_utc_offsets() -> Vec<i32> {
    vec![0]
}

fn default_scale() -> usize {
    4
}

fn default_opacity() -> f64 {
    0.7
}

fn default_background() -> ColorSpec {
    ColorSpec::Hex("#000000".to_string())
}

impl DispersionImagesFile {
    /// Scheme names for `series` when rendering `parameter`: a parameter
    /// override wins over the shared list.
    pub fn scheme_names(&self, parameter: &str, series: TimeSeriesType) -> Vec<String> {
        let overrides = self.parameter_overrides.get(&parameter.to_uppercase());
        let lookup = |t: TimeSeriesType| {
            overrides
                .and_then(|o| o.get(t))
                .or_else(|| self.series.get(t))
        };

        let names = match series {
            TimeSeriesType::DailyMaximum | TimeSeriesType::DailyMinimum => {
                lookup(series).or_else(|| lookup(TimeSeriesType::Hourly))
            }
            _ => lookup(series),
        };
        names.cloned().unwrap_or_default()
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Read and parse a configuration file with environment variable substitution.
///
/// The result is not validated; see [`validate_config`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DispersionImagesFile> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

    parse_config(&content)
        .with_context(|| format!("Failed to parse configuration from {:?}", path.as_ref()))
}

/// Parse configuration YAML text.
pub fn parse_config(content: &str) -> Result<DispersionImagesFile> {
    let expanded = expand_env_vars(content)?;
    let config: DispersionImagesFile = serde_yaml::from_str(&expanded)?;
    Ok(config)
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in YAML content
/// Supports ${VAR} and ${VAR:-default} syntax
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Check everything that does not need the color schemes resolved.
pub fn validate_config(config: &DispersionImagesFile) -> Result<()> {
    anyhow::ensure!(
        !config.input.filename.trim().is_empty(),
        "Input filename cannot be empty"
    );
    anyhow::ensure!(
        !config.input.parameter.trim().is_empty(),
        "Input parameter cannot be empty"
    );
    anyhow::ensure!(!config.input.layers.is_empty(), "At least one layer is required");
    anyhow::ensure!(
        !config.output.directory.trim().is_empty(),
        "Output directory cannot be empty"
    );

    let images = &config.images;
    anyhow::ensure!(images.scale >= 1, "Image scale must be at least 1");
    anyhow::ensure!(
        (0.0..=1.0).contains(&images.opacity),
        "Image opacity {} outside [0, 1]",
        images.opacity
    );
    for offset in &images.daily_utc_offsets {
        anyhow::ensure!(
            *offset > -24 && *offset < 24,
            "Daily UTC offset {} must be between -23 and 23",
            offset
        );
    }

    let sections =
        std::iter::once(&config.series).chain(config.parameter_overrides.values());
    for section in sections {
        for name in section.names() {
            anyhow::ensure!(
                config.schemes.contains_key(name),
                "Color scheme '{}' is referenced but not defined under schemes",
                name
            );
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"
input:
  filename: smoke_dispersion.nc
  parameter: PM25
output:
  directory: /tmp/out
series:
  hourly: [Aqi]
schemes:
  Aqi:
    colors:
      hex: ["#000000", "#00E400", "#FFFF00"]
    levels: [0, 12, 35, 1000]
"##;

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("DISPERSION_TEST_OUT", "/data/out");
        let result = expand_env_vars("directory: ${DISPERSION_TEST_OUT}").unwrap();
        assert_eq!(result, "directory: /data/out");
    }

    #[test]
    fn test_expand_env_vars_default() {
        std::env::remove_var("DISPERSION_TEST_UNSET");
        let result = expand_env_vars("scale: ${DISPERSION_TEST_UNSET:-4}").unwrap();
        assert_eq!(result, "scale: 4");
    }

    #[test]
    fn test_expand_env_vars_missing_is_error() {
        std::env::remove_var("DISPERSION_TEST_MISSING");
        assert!(expand_env_vars("x: ${DISPERSION_TEST_MISSING}").is_err());
        assert!(expand_env_vars("x: ${UNCLOSED").is_err());
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = parse_config(MINIMAL).unwrap();
        validate_config(&config).unwrap();

        assert_eq!(config.input.layers, vec![0]);
        assert_eq!(config.images.daily_utc_offsets, vec![0]);
        assert_eq!(config.images.scale, 4);
        assert_eq!(config.images.row_order, RowOrderSetting::Auto);
        assert_eq!(config.images.geotiff, GeotiffExports::default());
    }

    #[test]
    fn test_daily_max_falls_back_to_hourly() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(
            config.scheme_names("PM25", TimeSeriesType::DailyMaximum),
            vec!["Aqi".to_string()]
        );
        assert!(config
            .scheme_names("PM25", TimeSeriesType::DailyAverage)
            .is_empty());
    }

    #[test]
    fn test_parameter_override_wins() {
        let mut config = parse_config(MINIMAL).unwrap();
        config.parameter_overrides.insert(
            "VISUAL_RANGE".to_string(),
            SeriesSection {
                hourly: Some(vec![]),
                ..Default::default()
            },
        );

        assert!(config
            .scheme_names("visual_range", TimeSeriesType::Hourly)
            .is_empty());
        assert_eq!(config.scheme_names("PM25", TimeSeriesType::Hourly).len(), 1);
    }

    #[test]
    fn test_undefined_scheme_rejected() {
        let mut config = parse_config(MINIMAL).unwrap();
        config.series.daily_average = Some(vec!["Missing".to_string()]);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("Missing"));
    }

    #[test]
    fn test_offset_range() {
        let mut config = parse_config(MINIMAL).unwrap();
        config.images.daily_utc_offsets = vec![-5, 24];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_color_forms() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.images.background_color, ColorSpec::Hex("#000000".to_string()));
        assert!(matches!(&config.schemes["Aqi"].colors, SchemeColors::Hex(hex) if hex.len() == 3));

        let rgb = MINIMAL.replace(
            r##"hex: ["#000000", "#00E400", "#FFFF00"]"##,
            "rgb: {red: [0, 0], green: [0, 228], blue: [0, 0]}",
        );
        let config = parse_config(&rgb).unwrap();
        assert!(matches!(&config.schemes["Aqi"].colors, SchemeColors::Rgb(c) if c.green == [0, 228]));
    }

    #[test]
    fn test_scheme_needs_one_color_form() {
        let both = MINIMAL.replace(
            "    levels: [0, 12, 35, 1000]",
            "      rgb: {red: [0], green: [0], blue: [0]}\n    levels: [0, 12, 35, 1000]",
        );
        assert!(parse_config(&both).is_err());

        let neither = MINIMAL.replace(
            r##"      hex: ["#000000", "#00E400", "#FFFF00"]"##,
            "      {}",
        );
        assert!(parse_config(&neither).is_err());
    }

    #[test]
    fn test_background_needs_one_color_form() {
        let both = format!(
            "{}images:\n  background_color: {{rgb: [0, 0, 0], hex: \"#000000\"}}\n",
            MINIMAL
        );
        assert!(parse_config(&both).is_err());

        let rgb = format!("{}images:\n  background_color: {{rgb: [255, 255, 255]}}\n", MINIMAL);
        let config = parse_config(&rgb).unwrap();
        assert_eq!(config.images.background_color, ColorSpec::Rgb([255, 255, 255]));
    }
}
