//! In-memory `[time, layer, row, col]` raster series.

use chrono::{DateTime, Duration, Utc};
use dispersion_common::{BoundingBox, DispersionError, DispersionResult, GridSlice, GridSpec};

use crate::ioapi::IoapiMetadata;
use crate::row_order::RowOrder;
use crate::visibility;

/// A dispersion parameter over time and height on a regular lat/lon grid.
///
/// Values are stored flat, time-major then layer then row, in the row order
/// GDAL returned them (see [`GridSpec::is_north_up`]).
#[derive(Debug, Clone)]
pub struct RasterSeries {
    grid: GridSpec,
    heights: Vec<String>,
    num_layers: usize,
    num_times: usize,
    start: DateTime<Utc>,
    time_step: Duration,
    visibility: bool,
    data: Vec<f32>,
}

impl RasterSeries {
    /// Build directly from a flat `[time, layer, row, col]` buffer.
    pub fn new(
        grid: GridSpec,
        heights: Vec<String>,
        start: DateTime<Utc>,
        time_step: Duration,
        num_times: usize,
        data: Vec<f32>,
        visibility: bool,
    ) -> DispersionResult<Self> {
        let num_layers = heights.len();
        if num_layers == 0 {
            return Err(DispersionError::input("Series has no vertical layers"));
        }
        let expected = num_times * num_layers * grid.len();
        if data.len() != expected {
            return Err(DispersionError::input(format!(
                "Series buffer has {} values, expected {} ({} times x {} layers x {}x{})",
                data.len(),
                expected,
                num_times,
                num_layers,
                grid.ny,
                grid.nx
            )));
        }

        Ok(Self {
            grid,
            heights,
            num_layers,
            num_times,
            start,
            time_step,
            visibility,
            data,
        })
    }

    /// Assemble from IO/API metadata and the raw GDAL bands.
    ///
    /// Band `b` holds time `b / nlays`, layer `b % nlays`. When `visibility`
    /// is set the bands hold PM2.5 and are converted to visual range.
    pub fn from_parts(
        metadata: &IoapiMetadata,
        row_order: RowOrder,
        bands: Vec<Vec<f32>>,
        visibility: bool,
    ) -> DispersionResult<Self> {
        let nlays = metadata.nlays;
        if nlays == 0 {
            return Err(DispersionError::input("NLAYS is zero"));
        }
        if bands.len() % nlays != 0 {
            return Err(DispersionError::input(format!(
                "Band count {} is not a multiple of the layer count {}",
                bands.len(),
                nlays
            )));
        }

        let grid = GridSpec::from_geo_transform(
            &metadata.geo_transform(row_order),
            metadata.ncols,
            metadata.nrows,
        );
        let frame_len = grid.len();
        let num_times = bands.len() / nlays;

        let mut data = vec![0.0f32; bands.len() * frame_len];
        for (band_index, band) in bands.into_iter().enumerate() {
            if band.len() != frame_len {
                return Err(DispersionError::input(format!(
                    "Band {} has {} values, expected {}",
                    band_index + 1,
                    band.len(),
                    frame_len
                )));
            }
            let (time, layer) = (band_index / nlays, band_index % nlays);
            let offset = (time * nlays + layer) * frame_len;
            data[offset..offset + frame_len].copy_from_slice(&band);
        }

        if visibility {
            visibility::convert_in_place(&mut data);
        }

        Self::new(
            grid,
            metadata.heights.clone(),
            metadata.start,
            metadata.time_step,
            num_times,
            data,
            visibility,
        )
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn heights(&self) -> &[String] {
        &self.heights
    }

    pub fn num_layers(&self) -> usize {
        self.num_layers
    }

    pub fn num_times(&self) -> usize {
        self.num_times
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn time_step(&self) -> Duration {
        self.time_step
    }

    /// True when values are visual range derived from PM2.5.
    pub fn is_visibility(&self) -> bool {
        self.visibility
    }

    /// Timestamp of every time step.
    pub fn datetimes(&self) -> Vec<DateTime<Utc>> {
        (0..self.num_times)
            .map(|i| self.start + self.time_step * i as i32)
            .collect()
    }

    pub fn x_values(&self) -> Vec<f64> {
        self.grid.x_values()
    }

    pub fn y_values(&self) -> Vec<f64> {
        self.grid.y_values()
    }

    /// `(min x, min y, max x, max y)` of the grid points.
    pub fn bbox(&self) -> BoundingBox {
        self.grid.bbox()
    }

    /// Values of one time step and layer, row-major.
    pub fn frame(&self, time: usize, layer: usize) -> &[f32] {
        let len = self.grid.len();
        let offset = (time * self.num_layers + layer) * len;
        &self.data[offset..offset + len]
    }

    /// Copy of one time step and layer as a 2-D slice.
    pub fn slice(&self, time: usize, layer: usize) -> DispersionResult<GridSlice> {
        if time >= self.num_times || layer >= self.num_layers {
            return Err(DispersionError::InvalidArgument(format!(
                "Slice ({}, {}) outside series of {} times x {} layers",
                time, layer, self.num_times, self.num_layers
            )));
        }
        Ok(GridSlice::new(self.grid, self.frame(time, layer).to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn metadata(nlays: usize) -> IoapiMetadata {
        IoapiMetadata {
            x_orig: -100.0,
            y_orig: 40.0,
            x_cell: 1.0,
            y_cell: 1.0,
            nrows: 2,
            ncols: 3,
            nlays,
            heights: (0..nlays).map(|l| (10 * (l + 1)).to_string()).collect(),
            start: Utc.with_ymd_and_hms(2014, 6, 1, 0, 0, 0).unwrap(),
            time_step: Duration::hours(1),
        }
    }

    fn band(value: f32) -> Vec<f32> {
        vec![value; 6]
    }

    #[test]
    fn test_layer_varies_fastest() {
        // Band value encodes (time * 10 + layer)
        let bands = vec![band(0.0), band(1.0), band(10.0), band(11.0), band(20.0), band(21.0)];
        let series = RasterSeries::from_parts(&metadata(2), RowOrder::NorthUp, bands, false).unwrap();

        assert_eq!(series.num_times(), 3);
        assert_eq!(series.num_layers(), 2);
        assert_eq!(series.frame(1, 0)[0], 10.0);
        assert_eq!(series.frame(2, 1)[5], 21.0);
    }

    #[test]
    fn test_band_count_not_multiple_of_layers() {
        let bands = vec![band(0.0), band(1.0), band(2.0)];
        let err = RasterSeries::from_parts(&metadata(2), RowOrder::NorthUp, bands, false).unwrap_err();
        assert!(matches!(err, DispersionError::Input(_)));
    }

    #[test]
    fn test_band_size_mismatch() {
        let bands = vec![vec![1.0; 5]];
        assert!(RasterSeries::from_parts(&metadata(1), RowOrder::NorthUp, bands, false).is_err());
    }

    #[test]
    fn test_visibility_conversion_applied() {
        let bands = vec![vec![0.5, 1.0, 10.0, 539.0, 1078.0, 0.0]];
        let series = RasterSeries::from_parts(&metadata(1), RowOrder::NorthUp, bands, true).unwrap();
        assert!(series.is_visibility());
        assert_eq!(series.frame(0, 0), &[539.0, 539.0, 53.9, 1.0, 0.5, 539.0]);
    }

    #[test]
    fn test_datetimes_step_hourly() {
        let bands = vec![band(0.0); 4];
        let series = RasterSeries::from_parts(&metadata(1), RowOrder::NorthUp, bands, false).unwrap();
        let times = series.datetimes();
        assert_eq!(times.len(), 4);
        assert_eq!(times[3], Utc.with_ymd_and_hms(2014, 6, 1, 3, 0, 0).unwrap());
    }

    #[test]
    fn test_bbox_is_independent_of_row_order() {
        let north = RasterSeries::from_parts(&metadata(1), RowOrder::NorthUp, vec![band(0.0)], false).unwrap();
        let south = RasterSeries::from_parts(&metadata(1), RowOrder::SouthUp, vec![band(0.0)], false).unwrap();
        assert_eq!(north.bbox(), south.bbox());
        assert_eq!(north.bbox().as_wsen(), (-100.0, 40.0, -98.0, 41.0));
    }

    #[test]
    fn test_slice_out_of_range() {
        let series = RasterSeries::from_parts(&metadata(1), RowOrder::NorthUp, vec![band(0.0)], false).unwrap();
        assert!(series.slice(0, 0).is_ok());
        assert!(matches!(series.slice(1, 0), Err(DispersionError::InvalidArgument(_))));
        assert!(matches!(series.slice(0, 1), Err(DispersionError::InvalidArgument(_))));
    }
}
