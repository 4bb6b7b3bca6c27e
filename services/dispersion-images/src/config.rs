//! Run configuration, resolved once from the YAML file.

use std::path::{Path, PathBuf};

use anyhow::Result;
use dispersion_common::{DispersionError, DispersionResult, Rgb, TimeSeriesType};
use dispersion_grid::{is_visual_range, RowOrderSetting};
use renderer::{ColorMap, ColorScheme, RenderOptions};

use crate::config_loader::{self, ColorSpec, DispersionImagesFile, SchemeColors, SchemeSection};
use crate::image_set::{GeotiffExports, ImageSetContext, NamedScheme, SchemesBySeries};

/// Everything one run needs, with color schemes built and checked.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_file: PathBuf,
    pub parameter: String,
    pub layers: Vec<usize>,
    /// `<output directory>-<parameter>`; every image set lives below it
    pub output_root: PathBuf,
    pub utc_offsets: Vec<i32>,
    pub row_order: RowOrderSetting,
    pub render: RenderOptions,
    pub exports: GeotiffExports,
    pub schemes: SchemesBySeries,
}

impl RunConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = config_loader::load_config(path)?;
        Self::from_file(&file)
    }

    /// Validate a parsed file and resolve its color schemes.
    pub fn from_file(file: &DispersionImagesFile) -> Result<Self> {
        config_loader::validate_config(file)?;

        let parameter = file.input.parameter.trim().to_string();
        let render = RenderOptions {
            scale: file.images.scale,
            contour_lines: file.images.contour_lines,
            ..Default::default()
        };

        Ok(Self {
            input_file: PathBuf::from(&file.input.filename),
            layers: file.input.layers.clone(),
            output_root: images_root(&file.output.directory, &parameter),
            utc_offsets: file.images.daily_utc_offsets.clone(),
            row_order: file.images.row_order,
            render,
            exports: file.images.geotiff,
            schemes: resolve_schemes(file, &parameter)?,
            parameter,
        })
    }

    pub fn context(&self) -> ImageSetContext<'_> {
        ImageSetContext {
            parameter: &self.parameter,
            output_root: &self.output_root,
            options: self.render,
            exports: self.exports,
        }
    }
}

/// Image sets for a parameter go to a sibling of the output directory
/// suffixed with the lower-cased parameter name.
pub fn images_root(output_dir: &str, parameter: &str) -> PathBuf {
    PathBuf::from(format!(
        "{}-{}",
        output_dir.trim_end_matches('/'),
        parameter.to_lowercase()
    ))
}

/// Percent-of-simulations parameters are binned with `percent_levels`.
pub fn is_percent_parameter(parameter: &str) -> bool {
    let upper = parameter.to_uppercase();
    upper.contains("PERCENT") || upper.contains("PCNTSIMS")
}

fn resolve_color(spec: &ColorSpec, field: &str) -> DispersionResult<Rgb> {
    match spec {
        ColorSpec::Rgb([r, g, b]) => Rgb::from_channels(*r, *g, *b),
        ColorSpec::Hex(hex) => Rgb::from_hex(hex),
    }
    .map_err(|e| match e {
        DispersionError::Config(msg) => DispersionError::config(format!("{}: {}", field, msg)),
        other => other,
    })
}

/// Background color for `parameter`.
pub fn background_color(file: &DispersionImagesFile, parameter: &str) -> DispersionResult<Rgb> {
    match (&file.images.background_color_visual_range, is_visual_range(parameter)) {
        (Some(spec), true) => resolve_color(spec, "images.background_color_visual_range"),
        _ => resolve_color(&file.images.background_color, "images.background_color"),
    }
}

/// Build one named scheme for `parameter`.
pub fn build_scheme(
    name: &str,
    section: &SchemeSection,
    parameter: &str,
    background: Rgb,
    default_opacity: f64,
) -> DispersionResult<ColorScheme> {
    let map = match &section.colors {
        SchemeColors::Rgb(rgb) => ColorMap::from_rgb(&rgb.red, &rgb.green, &rgb.blue),
        SchemeColors::Hex(hex) => ColorMap::from_hex(hex.as_slice()),
    }
    .map_err(|e| in_scheme(name, e))?;

    let levels = if is_percent_parameter(parameter) {
        section.percent_levels.as_deref().ok_or_else(|| {
            DispersionError::config(format!(
                "Color scheme '{}' has no percent_levels for parameter {}",
                name, parameter
            ))
        })?
    } else {
        section.levels.as_slice()
    };

    map.with_levels(levels)
        .and_then(|scheme| {
            scheme
                .with_background(background)
                .with_opacity(section.opacity.unwrap_or(default_opacity))
        })
        .map_err(|e| in_scheme(name, e))
}

fn in_scheme(name: &str, err: DispersionError) -> DispersionError {
    match err {
        DispersionError::Config(msg) => {
            DispersionError::config(format!("Color scheme '{}': {}", name, msg))
        }
        other => other,
    }
}

/// Schemes for every series type the parameter renders.
pub fn resolve_schemes(file: &DispersionImagesFile, parameter: &str) -> DispersionResult<SchemesBySeries> {
    let background = background_color(file, parameter)?;
    let visibility = is_visual_range(parameter);

    let mut resolved = SchemesBySeries::new();
    for series in TimeSeriesType::all_for_parameter(visibility) {
        let mut schemes = Vec::new();
        for name in file.scheme_names(parameter, series) {
            let section = file.schemes.get(&name).ok_or_else(|| {
                DispersionError::config(format!("Color scheme '{}' is not defined", name))
            })?;
            let scheme = build_scheme(&name, section, parameter, background, file.images.opacity)?;
            schemes.push(NamedScheme { name, scheme });
        }
        if !schemes.is_empty() {
            resolved.insert(series, schemes);
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_loader::parse_config;

    const CONFIG: &str = r##"
input:
  filename: smoke_dispersion.nc
  parameter: PM25
  layers: [0, 1]
output:
  directory: /tmp/bluesky/
images:
  daily_utc_offsets: [-5, 0]
  opacity: 0.5
  background_color:
    rgb: [0, 0, 0]
  background_color_visual_range:
    hex: "#FFFFFF"
  geotiff:
    rgba: true
series:
  hourly: [Aqi]
  three_hour: [Aqi]
  daily_average: [Aqi, Percent]
schemes:
  Aqi:
    colors:
      rgb:
        red: [0, 0, 255]
        green: [0, 228, 255]
        blue: [0, 0, 0]
    levels: [0, 12, 35, 1000]
    opacity: 0.8
  Percent:
    colors:
      hex: ["#000000", "#FF0000"]
    levels: [0, 10, 100]
    percent_levels: [0, 50, 100]
"##;

    #[test]
    fn test_resolves_run_config() {
        let run = RunConfig::from_file(&parse_config(CONFIG).unwrap()).unwrap();

        assert_eq!(run.output_root, PathBuf::from("/tmp/bluesky-pm25"));
        assert_eq!(run.layers, vec![0, 1]);
        assert_eq!(run.utc_offsets, vec![-5, 0]);
        assert!(run.exports.rgba && !run.exports.raw);

        let hourly = &run.schemes[&TimeSeriesType::Hourly];
        assert_eq!(hourly[0].name, "Aqi");
        assert_eq!(hourly[0].scheme.opacity(), 0.8);
        assert_eq!(hourly[0].scheme.background(), Some(Rgb::BLACK));

        // Daily maximum borrows the hourly schemes; no daily minimum for PM25
        assert!(run.schemes.contains_key(&TimeSeriesType::DailyMaximum));
        assert!(!run.schemes.contains_key(&TimeSeriesType::DailyMinimum));

        let daily = &run.schemes[&TimeSeriesType::DailyAverage];
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[1].scheme.levels(), &[0.0, 10.0, 100.0]);
        assert_eq!(daily[1].scheme.opacity(), 0.5);
    }

    #[test]
    fn test_percent_parameter_uses_percent_levels() {
        let mut file = parse_config(CONFIG).unwrap();
        file.input.parameter = "PCNTSIMS".to_string();
        file.series.hourly = Some(vec!["Percent".to_string()]);

        let run = RunConfig::from_file(&file).unwrap();
        let hourly = &run.schemes[&TimeSeriesType::Hourly];
        assert_eq!(hourly[0].scheme.levels(), &[0.0, 50.0, 100.0]);
    }

    #[test]
    fn test_percent_parameter_without_percent_levels_fails() {
        let mut file = parse_config(CONFIG).unwrap();
        file.input.parameter = "PERCENT_ABOVE".to_string();

        let err = RunConfig::from_file(&file).unwrap_err();
        let err = err.downcast_ref::<DispersionError>().unwrap();
        assert!(matches!(err, DispersionError::Config(_)));
        assert!(err.to_string().contains("Aqi"));
    }

    #[test]
    fn test_visual_range_background_and_series() {
        let mut file = parse_config(CONFIG).unwrap();
        file.input.parameter = "VISUAL_RANGE".to_string();

        let run = RunConfig::from_file(&file).unwrap();
        let scheme = &run.schemes[&TimeSeriesType::Hourly][0].scheme;
        assert_eq!(scheme.background(), Some(Rgb::WHITE));
        assert!(run.schemes.contains_key(&TimeSeriesType::DailyMinimum));
        assert!(!run.schemes.contains_key(&TimeSeriesType::DailyMaximum));
        assert_eq!(run.output_root, PathBuf::from("/tmp/bluesky-visual_range"));
    }

    #[test]
    fn test_bad_levels_are_config_errors() {
        let mut file = parse_config(CONFIG).unwrap();
        if let Some(aqi) = file.schemes.get_mut("Aqi") {
            aqi.levels = vec![0.0, 35.0, 12.0, 1000.0];
        }
        let err = RunConfig::from_file(&file).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DispersionError>(),
            Some(DispersionError::Config(_))
        ));
    }

    #[test]
    fn test_bad_background_names_field() {
        let mut file = parse_config(CONFIG).unwrap();
        file.images.background_color = ColorSpec::Hex("#12345".to_string());
        let err = RunConfig::from_file(&file).unwrap_err();
        assert!(err.to_string().contains("images.background_color"), "{}", err);
    }

    #[test]
    fn test_percent_detection() {
        assert!(is_percent_parameter("PCNTSIMS"));
        assert!(is_percent_parameter("percent_above_35"));
        assert!(!is_percent_parameter("PM25"));
    }
}
