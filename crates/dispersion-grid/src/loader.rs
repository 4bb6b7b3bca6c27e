//! GDAL-backed reader for dispersion NetCDF files.

use std::path::Path;

use dispersion_common::{DispersionError, DispersionResult};
use gdal::errors::GdalError;
use gdal::{Dataset, Metadata};
use tracing::{debug, info};

use crate::ioapi::IoapiMetadata;
use crate::row_order::RowOrderSetting;
use crate::series::RasterSeries;
use crate::visibility;

/// Load `parameter` from a dispersion NetCDF file, detecting row order from the GDAL version.
///
/// `parameter` may be any spelling of "visual range", in which case PM2.5 is
/// read and converted.
pub fn load(path: impl AsRef<Path>, parameter: &str) -> DispersionResult<RasterSeries> {
    load_with_row_order(path, parameter, RowOrderSetting::Auto)
}

/// Like [`load`] with an explicit row order setting.
pub fn load_with_row_order(
    path: impl AsRef<Path>,
    parameter: &str,
    row_order: RowOrderSetting,
) -> DispersionResult<RasterSeries> {
    let path = path.as_ref();
    if parameter.trim().is_empty() {
        return Err(DispersionError::input("Parameter name is empty"));
    }
    if !path.exists() {
        return Err(DispersionError::input(format!(
            "Dispersion file does not exist: {}",
            path.display()
        )));
    }

    let is_visibility = visibility::is_visual_range(parameter);
    let variable = visibility::source_parameter(parameter);
    let subdataset = format!("NETCDF:\"{}\":{}", path.display(), variable);

    info!(path = %path.display(), parameter, variable, "Loading dispersion grid");

    let dataset = Dataset::open(&subdataset).map_err(|e| gdal_input(&subdataset, e))?;

    let strings = dataset.metadata_domain("").unwrap_or_default();
    let metadata = IoapiMetadata::from_metadata_strings(&strings)?;

    let (cols, rows) = dataset.raster_size();
    if cols != metadata.ncols || rows != metadata.nrows {
        return Err(DispersionError::input(format!(
            "Raster is {}x{} but NCOLS/NROWS say {}x{}",
            cols, rows, metadata.ncols, metadata.nrows
        )));
    }

    let order = row_order.resolve();
    debug!(
        ?order,
        geo_transform = ?metadata.geo_transform(order),
        nlays = metadata.nlays,
        "Resolved grid geometry"
    );

    let band_count = dataset.raster_count();
    let mut bands = Vec::with_capacity(band_count);
    for index in 1..=band_count {
        let band = dataset
            .rasterband(index)
            .map_err(|e| gdal_input(&subdataset, e))?;
        let buffer = band
            .read_as::<f32>((0, 0), (cols, rows), (cols, rows), None)
            .map_err(|e| gdal_input(&subdataset, e))?;
        bands.push(buffer.into_iter().collect::<Vec<f32>>());
    }

    let series = RasterSeries::from_parts(&metadata, order, bands, is_visibility)?;

    info!(
        times = series.num_times(),
        layers = series.num_layers(),
        start = %series.start(),
        "Loaded dispersion grid"
    );

    Ok(series)
}

fn gdal_input(subdataset: &str, err: GdalError) -> DispersionError {
    DispersionError::input(format!("GDAL failed reading {}: {}", subdataset, err))
}
