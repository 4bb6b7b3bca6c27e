//! Resampling a grid slice onto the output pixel grid.
//!
//! Every output (PNG and GeoTIFFs) is produced from one [`PixelField`] so the
//! images line up exactly and classify identically.

use dispersion_common::{BoundingBox, DispersionError, DispersionResult, GridSlice};

/// Values sampled at pixel centres over the extent of the grid points,
/// row 0 at the north edge.
#[derive(Debug, Clone)]
pub struct PixelField {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f32>,
    pub bbox: BoundingBox,
    /// Source grid spacing `(|dx|, |dy|)` divided by the scale
    pub cell_size: (f64, f64),
}

impl PixelField {
    /// `(west, pixel width, 0, north, 0, -pixel height)`
    ///
    /// A single row or column has no extent along that axis, so its pixels
    /// take the grid spacing instead.
    pub fn geo_transform(&self) -> [f64; 6] {
        let pixel_width = match self.bbox.width() / self.width as f64 {
            w if w > 0.0 => w,
            _ => self.cell_size.0,
        };
        let pixel_height = match self.bbox.height() / self.height as f64 {
            h if h > 0.0 => h,
            _ => self.cell_size.1,
        };
        [
            self.bbox.min_x,
            pixel_width,
            0.0,
            self.bbox.max_y,
            0.0,
            -pixel_height,
        ]
    }

    /// Largest finite value, if any.
    pub fn max_value(&self) -> Option<f32> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f32| m.max(v))))
    }
}

/// Resample `slice` to `cols * scale` by `rows * scale` pixels.
pub fn resample_slice(slice: &GridSlice, scale: usize) -> DispersionResult<PixelField> {
    if scale == 0 {
        return Err(DispersionError::InvalidArgument("Scale must be at least 1".into()));
    }
    if slice.spec.is_empty() {
        return Err(DispersionError::render("Cannot render an empty grid"));
    }

    let north_up = slice.clone().into_north_up();
    let (src_width, src_height) = (north_up.width(), north_up.height());
    let (width, height) = (src_width * scale, src_height * scale);

    Ok(PixelField {
        width,
        height,
        values: resample_grid(&north_up.values, src_width, src_height, width, height),
        bbox: north_up.spec.bbox(),
        cell_size: (
            north_up.spec.dx.abs() / scale as f64,
            north_up.spec.dy.abs() / scale as f64,
        ),
    })
}

/// Bilinear resampling where source values sit on grid points spanning the
/// full extent and destination values are taken at pixel centres.
pub fn resample_grid(
    data: &[f32],
    src_width: usize,
    src_height: usize,
    dst_width: usize,
    dst_height: usize,
) -> Vec<f32> {
    let mut output = vec![0.0f32; dst_width * dst_height];
    if src_width == 0 || src_height == 0 {
        return output;
    }

    let x_ratio = (src_width - 1) as f32 / dst_width as f32;
    let y_ratio = (src_height - 1) as f32 / dst_height as f32;

    for y in 0..dst_height {
        let src_y = (y as f32 + 0.5) * y_ratio;
        let y1 = (src_y.floor() as usize).min(src_height - 1);
        let y2 = (y1 + 1).min(src_height - 1);
        let dy = src_y - y1 as f32;

        for x in 0..dst_width {
            let src_x = (x as f32 + 0.5) * x_ratio;
            let x1 = (src_x.floor() as usize).min(src_width - 1);
            let x2 = (x1 + 1).min(src_width - 1);
            let dx = src_x - x1 as f32;

            let v11 = data[y1 * src_width + x1];
            let v21 = data[y1 * src_width + x2];
            let v12 = data[y2 * src_width + x1];
            let v22 = data[y2 * src_width + x2];

            // Exact weights of zero keep a NaN neighbour from leaking in
            let v1 = lerp(v11, v21, dx);
            let v2 = lerp(v12, v22, dx);
            output[y * dst_width + x] = lerp(v1, v2, dy);
        }
    }

    output
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        a * (1.0 - t) + b * t
    }
}
