//! Georeferenced GeoTIFF exports of a classified pixel field.
//!
//! All three exports are written from the same [`PixelField`] and bin
//! assignment as the PNG, in EPSG:4326.

use std::path::Path;

use dispersion_common::{DispersionError, DispersionResult};
use gdal::cpl::CslStringList;
use gdal::errors::GdalError;
use gdal::raster::{Buffer, ColorEntry, ColorInterpretation, ColorTable, PaletteInterpretation};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager, Metadata};
use tracing::debug;

use crate::classify::ColorScheme;
use crate::resample::PixelField;

/// Geographic lat/lon
pub const EPSG_WGS84: u32 = 4326;

/// Pixel value marking NaN in the classified export
pub const CLASSIFIED_NODATA: u8 = 255;

/// Largest raw value a UInt16 export can hold
const RAW_MAX: usize = u16::MAX as usize;

fn gdal_err<'a>(path: &'a Path, what: &str) -> impl FnOnce(GdalError) -> DispersionError + 'a {
    let what = what.to_string();
    move |e| DispersionError::render(format!("{} ({}): {}", what, path.display(), e))
}

/// True when GDAL can write GeoTIFFs in this environment.
pub fn gtiff_available() -> bool {
    DriverManager::get_driver_by_name("GTiff").is_ok()
}

fn create<T: gdal::raster::GdalType>(
    path: &Path,
    field: &PixelField,
    bands: usize,
    options: &[&str],
) -> DispersionResult<Dataset> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let driver =
        DriverManager::get_driver_by_name("GTiff").map_err(gdal_err(path, "GTiff driver unavailable"))?;

    let mut gdal_options = CslStringList::new();
    for opt in std::iter::once(&"COMPRESS=DEFLATE").chain(options) {
        gdal_options
            .add_string(opt)
            .map_err(gdal_err(path, "Bad creation option"))?;
    }

    let mut dataset = driver
        .create_with_band_type_with_options::<T, _>(
            path,
            field.width,
            field.height,
            bands,
            &gdal_options,
        )
        .map_err(gdal_err(path, "Failed to create dataset"))?;

    dataset
        .set_geo_transform(&field.geo_transform())
        .map_err(gdal_err(path, "Failed to set geo transform"))?;

    let srs = SpatialRef::from_epsg(EPSG_WGS84).map_err(gdal_err(path, "Failed to build EPSG:4326"))?;
    let wkt = srs
        .to_wkt()
        .map_err(gdal_err(path, "Failed to convert SpatialRef to WKT"))?;
    dataset
        .set_projection(&wkt)
        .map_err(gdal_err(path, "Failed to set projection"))?;

    Ok(dataset)
}

fn write_band<T: gdal::raster::GdalType + Copy>(
    dataset: &Dataset,
    path: &Path,
    index: usize,
    field: &PixelField,
    data: Vec<T>,
) -> DispersionResult<()> {
    let mut band = dataset
        .rasterband(index)
        .map_err(gdal_err(path, "Failed to get raster band"))?;
    let mut buffer = Buffer::new((field.width, field.height), data);
    band.write((0, 0), (field.width, field.height), &mut buffer)
        .map_err(gdal_err(path, "Failed to write raster data"))?;
    Ok(())
}

fn level_metadata(dataset: &mut Dataset, path: &Path, scheme: &ColorScheme) -> DispersionResult<()> {
    let levels: Vec<String> = scheme.levels().iter().map(|l| l.to_string()).collect();
    dataset
        .set_metadata_item("DISPERSION_LEVELS", &levels.join(" "), "")
        .map_err(gdal_err(path, "Failed to set level metadata"))
}

/// Alpha of one RGBA export pixel: `opacity` unless the value is exactly 0
/// or NaN.
pub fn rgba_alpha(value: f32, opacity: u8) -> u8 {
    if value == 0.0 || value.is_nan() {
        0
    } else {
        opacity
    }
}

/// Four byte bands: export color of each pixel's bin plus alpha.
///
/// Alpha is the scheme opacity except where the value is exactly 0, and for
/// NaN (no data), which is fully transparent.
pub fn write_rgba(
    path: &Path,
    field: &PixelField,
    bins: &[Option<usize>],
    scheme: &ColorScheme,
) -> DispersionResult<()> {
    let colors = scheme.export_colors();
    let alpha = scheme.alpha();
    let n = field.values.len();

    let (mut r, mut g, mut b, mut a) = (vec![0u8; n], vec![0u8; n], vec![0u8; n], vec![0u8; n]);
    for (i, (&value, bin)) in field.values.iter().zip(bins).enumerate() {
        let Some(bin) = *bin else { continue };
        let c = colors[bin];
        r[i] = c.r;
        g[i] = c.g;
        b[i] = c.b;
        a[i] = rgba_alpha(value, alpha);
    }

    let dataset = create::<u8>(path, field, 4, &["PHOTOMETRIC=RGB", "ALPHA=UNASSOCIATED"])?;
    for (index, data) in [r, g, b, a].into_iter().enumerate() {
        write_band(&dataset, path, index + 1, field, data)?;
    }

    let mut alpha_band = dataset
        .rasterband(4)
        .map_err(gdal_err(path, "Failed to get alpha band"))?;
    alpha_band
        .set_color_interpretation(ColorInterpretation::AlphaBand)
        .map_err(gdal_err(path, "Failed to mark alpha band"))?;

    debug!(path = %path.display(), width = field.width, height = field.height, "Wrote RGBA GeoTIFF");
    Ok(())
}

/// Number of palette entries needed for the raw export: every integer up to
/// the last breakpoint, extended to the field's maximum.
pub fn raw_palette_len(scheme: &ColorScheme, field_max: Option<f32>) -> usize {
    let levels = scheme.levels();
    let top_level = levels[levels.len() - 1].ceil().max(0.0) as usize;
    let observed = field_max
        .map(|m| m.ceil().max(0.0) as usize + 1)
        .unwrap_or(0);
    top_level.max(observed).clamp(1, RAW_MAX + 1)
}

/// Palette entry for raw value `v`: its bin's export color, alpha 0 for
/// transparent bins.
pub fn raw_palette_entry(scheme: &ColorScheme, value: usize) -> (u8, u8, u8, u8) {
    let colors = scheme.export_colors();
    match scheme.bin_index(value as f32) {
        Some(bin) if !scheme.is_transparent_bin(bin) => colors[bin].with_alpha(scheme.alpha()),
        Some(bin) => colors[bin].with_alpha(0),
        None => (0, 0, 0, 0),
    }
}

fn color_table(entries: impl Iterator<Item = (u8, u8, u8, u8)>) -> ColorTable<'static> {
    let mut table = ColorTable::new(PaletteInterpretation::Rgba);
    for (i, (r, g, b, a)) in entries.enumerate() {
        table.set_color_entry(
            i as u16,
            &ColorEntry::rgba(r as i16, g as i16, b as i16, a as i16),
        );
    }
    table
}

/// Round a value into the UInt16 range; NaN and negatives become 0.
pub fn raw_value(value: f32) -> u16 {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        value.round().min(u16::MAX as f32) as u16
    }
}

/// One UInt16 band of rounded values with a value-to-color palette.
pub fn write_raw(path: &Path, field: &PixelField, scheme: &ColorScheme) -> DispersionResult<()> {
    let data: Vec<u16> = field.values.iter().map(|&v| raw_value(v)).collect();
    let palette_len = raw_palette_len(scheme, field.max_value());

    let mut dataset = create::<u16>(path, field, 1, &[])?;
    write_band(&dataset, path, 1, field, data)?;

    let table = color_table((0..palette_len).map(|v| raw_palette_entry(scheme, v)));
    {
        let mut band = dataset
            .rasterband(1)
            .map_err(gdal_err(path, "Failed to get raster band"))?;
        band.set_color_table(&table);
    }

    level_metadata(&mut dataset, path, scheme)?;

    debug!(path = %path.display(), palette_len, "Wrote raw GeoTIFF");
    Ok(())
}

/// One byte band of bin indices with a per-bin palette.
pub fn write_classified(
    path: &Path,
    field: &PixelField,
    bins: &[Option<usize>],
    scheme: &ColorScheme,
) -> DispersionResult<()> {
    if scheme.num_bins() > CLASSIFIED_NODATA as usize {
        return Err(DispersionError::render(format!(
            "{} bins do not fit a byte raster",
            scheme.num_bins()
        )));
    }

    let data: Vec<u8> = bins
        .iter()
        .map(|bin| bin.map_or(CLASSIFIED_NODATA, |b| b as u8))
        .collect();

    let mut dataset = create::<u8>(path, field, 1, &[])?;
    write_band(&dataset, path, 1, field, data)?;

    let colors = scheme.export_colors();
    let alpha = scheme.alpha();
    let table = color_table(colors.iter().enumerate().map(|(bin, c)| {
        if scheme.is_transparent_bin(bin) {
            c.with_alpha(0)
        } else {
            c.with_alpha(alpha)
        }
    }));

    {
        let mut band = dataset
            .rasterband(1)
            .map_err(gdal_err(path, "Failed to get raster band"))?;
        band.set_color_table(&table);
        band.set_no_data_value(Some(CLASSIFIED_NODATA as f64))
            .map_err(gdal_err(path, "Failed to set no data value"))?;
    }

    level_metadata(&mut dataset, path, scheme)?;

    debug!(path = %path.display(), bins = colors.len(), "Wrote classified GeoTIFF");
    Ok(())
}
