//! Test data generators for synthetic dispersion output.
//!
//! These generators create predictable, verifiable patterns that can be
//! used across the test suite without a real BlueSky NetCDF file.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);  // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a smoke plume with concentration `peak` at the grid centre,
/// decaying with a Gaussian falloff and clean air (0.0) at the corners.
pub fn create_plume_grid(width: usize, height: usize, peak: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    let center_x = (width as f32 - 1.0) / 2.0;
    let center_y = (height as f32 - 1.0) / 2.0;
    let sigma = (width.min(height) as f32 / 8.0).max(0.5);

    for row in 0..height {
        for col in 0..width {
            let dx = col as f32 - center_x;
            let dy = row as f32 - center_y;
            let c = peak * (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp();
            // Clip the tail so edges are exactly clean
            data.push(if c < peak * 1e-3 { 0.0 } else { c });
        }
    }
    data
}

/// Creates a left-to-right linear ramp from `min` (column 0) to `max`
/// (last column), identical on every row.
pub fn create_ramp_grid(width: usize, height: usize, min: f32, max: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    let span = (width.max(2) - 1) as f32;
    for _row in 0..height {
        for col in 0..width {
            data.push(min + (max - min) * col as f32 / span);
        }
    }
    data
}

/// Creates a grid filled with a single value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a grid with NaN values at the given (col, row) positions,
/// zeros elsewhere.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

/// Creates raw GDAL-style bands for a `[time, layer]` series.
///
/// Bands are ordered with the layer varying fastest, as the netCDF driver
/// returns them. Every cell of band `(t, l)` holds `value(t, l)`.
pub fn create_interleaved_bands<F>(
    width: usize,
    height: usize,
    num_times: usize,
    num_layers: usize,
    value: F,
) -> Vec<Vec<f32>>
where
    F: Fn(usize, usize) -> f32,
{
    let mut bands = Vec::with_capacity(num_times * num_layers);
    for time in 0..num_times {
        for layer in 0..num_layers {
            bands.push(vec![value(time, layer); width * height]);
        }
    }
    bands
}

/// Creates a flat `[time, layer, row, col]` buffer where each frame is
/// constant at `value(t, l)`.
pub fn create_series_buffer<F>(
    width: usize,
    height: usize,
    num_times: usize,
    num_layers: usize,
    value: F,
) -> Vec<f32>
where
    F: Fn(usize, usize) -> f32,
{
    create_interleaved_bands(width, height, num_times, num_layers, value)
        .into_iter()
        .flatten()
        .collect()
}

/// Models-3 IO/API global attributes in GDAL `KEY=VALUE` form.
///
/// Describes a 0.1 degree lat/lon grid with its lower-left point at
/// (-120.0, 40.0), one-hour steps, and `nlays` layers at 10 m intervals.
pub fn create_ioapi_attributes(
    ncols: usize,
    nrows: usize,
    nlays: usize,
    sdate: i64,
    stime: i64,
) -> Vec<String> {
    let mut levels: Vec<String> = (1..=nlays).map(|l| (l * 10).to_string()).collect();
    levels.push("0".to_string());

    vec![
        "NC_GLOBAL#IOAPI_VERSION=$Id: @(#) ioapi library version 3.1 $".to_string(),
        "NC_GLOBAL#GDTYP=1".to_string(),
        "NC_GLOBAL#XORIG=-120.0".to_string(),
        "NC_GLOBAL#YORIG=40.0".to_string(),
        "NC_GLOBAL#XCELL=0.1".to_string(),
        "NC_GLOBAL#YCELL=0.1".to_string(),
        format!("NC_GLOBAL#NROWS={}", nrows),
        format!("NC_GLOBAL#NCOLS={}", ncols),
        format!("NC_GLOBAL#NLAYS={}", nlays),
        format!("NC_GLOBAL#VGLVLS={{{}}}", levels.join(",")),
        format!("NC_GLOBAL#SDATE={}", sdate),
        format!("NC_GLOBAL#STIME={}", stime),
        "NC_GLOBAL#TSTEP=10000".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_grid() {
        let grid = create_test_grid(10, 5);
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[0], 0.0); // col=0, row=0
        assert_eq!(grid[1], 1000.0); // col=1, row=0
        assert_eq!(grid[10], 1.0); // col=0, row=1
        assert_eq!(grid[11], 1001.0); // col=1, row=1
    }

    #[test]
    fn test_create_plume_grid() {
        let grid = create_plume_grid(21, 21, 100.0);
        assert_eq!(grid.len(), 441);
        assert_eq!(grid[10 * 21 + 10], 100.0);
        assert_eq!(grid[0], 0.0);
        let max = grid.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(max, 100.0);
    }

    #[test]
    fn test_create_ramp_grid() {
        let grid = create_ramp_grid(5, 2, 0.0, 100.0);
        assert_eq!(&grid[..5], &[0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(&grid[5..], &grid[..5]);
    }

    #[test]
    fn test_create_grid_with_nans() {
        let grid = create_grid_with_nans(10, 10, &[(5, 5), (0, 0)]);
        assert!(grid[0].is_nan());
        assert!(grid[55].is_nan());
        assert!(!grid[1].is_nan());
    }

    #[test]
    fn test_interleaved_band_order() {
        let bands = create_interleaved_bands(2, 2, 3, 2, |t, l| (t * 10 + l) as f32);
        assert_eq!(bands.len(), 6);
        assert_eq!(bands[1][0], 1.0); // time 0, layer 1
        assert_eq!(bands[2][0], 10.0); // time 1, layer 0
        assert_eq!(bands[5][3], 21.0);
    }

    #[test]
    fn test_series_buffer_len() {
        let data = create_series_buffer(3, 2, 4, 2, |_, _| 1.0);
        assert_eq!(data.len(), 3 * 2 * 4 * 2);
    }

    #[test]
    fn test_ioapi_attributes() {
        let attrs = create_ioapi_attributes(6, 4, 2, 2014152, 0);
        assert!(attrs.contains(&"NC_GLOBAL#VGLVLS={10,20,0}".to_string()));
        assert!(attrs.contains(&"NC_GLOBAL#NCOLS=6".to_string()));
    }
}
