//! Builds every image set for one loaded dispersion series.
//!
//! For each requested layer and each color scheme configured for a series
//! type, renders:
//! - hourly images, stamped one hour before each time step
//! - centred three-hour means for every interior time step
//! - daily maximum (or minimum, for visual range) and daily average images
//!   for every configured UTC offset
//!
//! plus one colorbar per set. Daily aggregates are computed once per UTC
//! offset and shared across layers and schemes.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use dispersion_common::{
    height_label, DispersionError, DispersionResult, GridSlice, ImageSetKey, TimeSeriesType,
};
use dispersion_grid::{
    aggregate, is_visual_range, three_hour_average, AggregateSet, DailyStatistic, RasterSeries,
};
use renderer::{render, render_legend, ColorScheme, RasterExports, RenderOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A color scheme under the name used in directories and file names.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedScheme {
    pub name: String,
    pub scheme: ColorScheme,
}

/// Schemes to render for each series type, in configuration order.
pub type SchemesBySeries = BTreeMap<TimeSeriesType, Vec<NamedScheme>>;

/// Which GeoTIFF exports to write next to every PNG.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeotiffExports {
    #[serde(default)]
    pub rgba: bool,
    #[serde(default)]
    pub raw: bool,
    #[serde(default)]
    pub classified: bool,
}

impl GeotiffExports {
    /// Export paths for the image with file stem `stem` in `dir`.
    pub fn paths(&self, dir: &Path, stem: &str) -> RasterExports {
        let path = |enabled: bool, suffix: &str| {
            enabled.then(|| dir.join(format!("{}_{}.tif", stem, suffix)))
        };
        RasterExports {
            rgba: path(self.rgba, "rgba"),
            raw: path(self.raw, "raw"),
            classified: path(self.classified, "classified"),
        }
    }
}

/// Where and how to write one run's images.
#[derive(Debug, Clone)]
pub struct ImageSetContext<'a> {
    /// Parameter name as configured; used lower-cased in file names
    pub parameter: &'a str,
    /// Root of all image set directories
    pub output_root: &'a Path,
    pub options: RenderOptions,
    pub exports: GeotiffExports,
}

/// Files written for one (height, series, offset, scheme) combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSetRecord {
    pub height: String,
    pub series: TimeSeriesType,
    pub utc_offset: Option<i32>,
    pub scheme: String,
    pub directory: PathBuf,
    pub images: Vec<PathBuf>,
    pub exports: Vec<PathBuf>,
    pub legend: Option<PathBuf>,
}

/// What the packaging step needs to place the images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSetSummary {
    /// First time step of the series (UTC)
    pub start_time: DateTime<Utc>,
    /// `(west, south, east, north)` of the grid points
    pub bbox: (f64, f64, f64, f64),
    /// Height labels of the rendered layers, in request order
    pub heights: Vec<String>,
    pub image_sets: Vec<ImageSetRecord>,
}

impl ImageSetSummary {
    pub fn image_count(&self) -> usize {
        self.image_sets.iter().map(|s| s.images.len()).sum()
    }
}

/// Daily aggregates of one series, computed on first use per UTC offset.
#[derive(Debug, Default)]
pub struct AggregateCache {
    sets: BTreeMap<i32, AggregateSet>,
}

impl AggregateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, series: &RasterSeries, utc_offset: i32) -> DispersionResult<&AggregateSet> {
        match self.sets.entry(utc_offset) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                debug!(utc_offset, "Computing daily aggregates");
                Ok(entry.insert(aggregate(series, utc_offset)?))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Render every configured image set for `layers` of `series`.
pub fn build_image_set(
    series: &RasterSeries,
    schemes: &SchemesBySeries,
    layers: &[usize],
    utc_offsets: &[i32],
    ctx: &ImageSetContext<'_>,
) -> DispersionResult<ImageSetSummary> {
    validate_layers(series, layers)?;

    let series_types = TimeSeriesType::all_for_parameter(series.is_visibility());
    let reachable = series_types.iter().any(|t| {
        let has_schemes = schemes.get(t).is_some_and(|list| !list.is_empty());
        has_schemes && (!t.is_daily() || !utc_offsets.is_empty())
    });
    if !reachable {
        return Err(DispersionError::config("No color maps defined"));
    }

    let mut aggregates = AggregateCache::new();
    let mut image_sets = Vec::new();

    for &layer in layers {
        let height = height_label(&series.heights()[layer]);

        for &series_type in &series_types {
            let Some(named_schemes) = schemes.get(&series_type) else {
                continue;
            };

            for named in named_schemes {
                let key = |utc_offset| ImageSetKey {
                    parameter: ctx.parameter,
                    height_label: &height,
                    series: series_type,
                    utc_offset,
                    scheme: &named.name,
                };

                match DailyStatistic::for_series(series_type) {
                    None => {
                        let frames = sub_daily_frames(series, series_type, layer)?;
                        image_sets.push(write_set(&key(None), &height, named, frames, ctx)?);
                    }
                    Some(stat) => {
                        for &utc_offset in utc_offsets {
                            let set = aggregates.get(series, utc_offset)?;
                            let frames = daily_frames(set, stat, layer)?;
                            image_sets.push(write_set(
                                &key(Some(utc_offset)),
                                &height,
                                named,
                                frames,
                                ctx,
                            )?);
                        }
                    }
                }
            }
        }
    }

    let summary = ImageSetSummary {
        start_time: series.start(),
        bbox: series.bbox().as_wsen(),
        heights: layers
            .iter()
            .map(|&l| series.heights()[l].clone())
            .collect(),
        image_sets,
    };

    info!(
        parameter = ctx.parameter,
        sets = summary.image_sets.len(),
        images = summary.image_count(),
        utc_offsets_aggregated = aggregates.len(),
        "Built image sets"
    );
    Ok(summary)
}

fn validate_layers(series: &RasterSeries, layers: &[usize]) -> DispersionResult<()> {
    if layers.is_empty() {
        return Err(DispersionError::config("No layers requested"));
    }
    if let Some(&max) = layers.iter().max() {
        if max >= series.num_layers() {
            let requested: Vec<String> = layers.iter().map(|l| l.to_string()).collect();
            return Err(DispersionError::config(format!(
                "Requested layers ({}) outside of what's available in dispersion grid (which has {} layer{})",
                requested.join(", "),
                series.num_layers(),
                if series.num_layers() > 1 { "s" } else { "" }
            )));
        }
    }
    Ok(())
}

/// Hourly or three-hour slices with their file-name time stamps.
fn sub_daily_frames(
    series: &RasterSeries,
    series_type: TimeSeriesType,
    layer: usize,
) -> DispersionResult<Vec<(NaiveDateTime, GridSlice)>> {
    let datetimes = series.datetimes();
    let stamp = |i: usize| (datetimes[i] - Duration::hours(1)).naive_utc();

    match series_type {
        TimeSeriesType::Hourly => (0..series.num_times())
            .map(|i| Ok((stamp(i), series.slice(i, layer)?)))
            .collect(),
        // The stamp of the middle hour, shifted like the hourly images
        _ => (1..series.num_times().saturating_sub(1))
            .map(|i| Ok((stamp(i), three_hour_average(series, i, layer)?)))
            .collect(),
    }
}

fn daily_frames(
    set: &AggregateSet,
    stat: DailyStatistic,
    layer: usize,
) -> DispersionResult<Vec<(NaiveDateTime, GridSlice)>> {
    set.dates
        .iter()
        .enumerate()
        .map(|(day, date)| Ok((*date, set.slice(stat, day, layer)?)))
        .collect()
}

/// Colorbar caption: the parameter with its units where known.
pub fn colorbar_caption(parameter: &str) -> String {
    if is_visual_range(parameter) {
        return "Visual Range (miles)".to_string();
    }
    match parameter.to_uppercase().as_str() {
        "PM25" => "PM2.5 (µg/m³)".to_string(),
        _ => parameter.to_string(),
    }
}

fn write_set(
    key: &ImageSetKey<'_>,
    height: &str,
    named: &NamedScheme,
    frames: Vec<(NaiveDateTime, GridSlice)>,
    ctx: &ImageSetContext<'_>,
) -> DispersionResult<ImageSetRecord> {
    let directory = key.directory(ctx.output_root);
    std::fs::create_dir_all(&directory)?;

    let total = frames.len();
    let mut images = Vec::with_capacity(total);
    let mut exports = Vec::new();

    for (i, (stamp, slice)) in frames.into_iter().enumerate() {
        let stem = key.file_stem(&stamp);
        let image_path = directory.join(format!("{}.png", stem));

        debug!(
            height,
            series = %key.series,
            scheme = %named.name,
            "Creating image {} of {}",
            i + 1,
            total
        );

        let result = render(
            &slice,
            &named.scheme,
            &image_path,
            &ctx.exports.paths(&directory, &stem),
            &ctx.options,
        )?;
        images.push(result.image_path);
        exports.extend(result.exports);
    }

    let legend_path = directory.join(format!("{}.png", key.legend_stem()));
    let legend = render_legend(&named.scheme, &colorbar_caption(ctx.parameter), &legend_path)?
        .map(|_| legend_path);

    info!(
        directory = %directory.display(),
        images = images.len(),
        "Wrote {} image set",
        key.series.pretty_name()
    );

    Ok(ImageSetRecord {
        height: height.to_string(),
        series: key.series,
        utc_offset: key.utc_offset,
        scheme: named.name.clone(),
        directory,
        images,
        exports,
        legend,
    })
}
