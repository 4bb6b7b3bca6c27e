//! Dual-format rendering: a viewable PNG plus optional GeoTIFF exports,
//! all from one resampled pixel field.

use std::path::{Path, PathBuf};

use dispersion_common::{DispersionResult, GridSlice};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::ColorScheme;
use crate::contour::{draw_contours, generate_contours, ContourStyle};
use crate::geotiff;
use crate::png::{create_png, create_png_auto, create_png_indexed, write_png, MAX_PALETTE_SIZE};
use crate::resample::{resample_slice, PixelField};

/// Presentation settings shared by every image of a run.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Output pixels per grid cell along each axis
    pub scale: usize,
    /// Overlay black isolines at every breakpoint
    pub contour_lines: bool,
    pub contour_style: ContourStyle,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 4,
            contour_lines: false,
            contour_style: ContourStyle::default(),
        }
    }
}

/// Destinations of the GeoTIFF exports; `None` skips that format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RasterExports {
    pub rgba: Option<PathBuf>,
    pub raw: Option<PathBuf>,
    pub classified: Option<PathBuf>,
}

impl RasterExports {
    pub fn is_empty(&self) -> bool {
        self.rgba.is_none() && self.raw.is_none() && self.classified.is_none()
    }
}

/// What was written, and the pixel grid every output shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResult {
    pub image_path: PathBuf,
    pub exports: Vec<PathBuf>,
    pub width: usize,
    pub height: usize,
    pub geo_transform: [f64; 6],
}

/// Bin of every pixel, `None` for NaN.
pub fn classify_field(field: &PixelField, scheme: &ColorScheme) -> Vec<Option<usize>> {
    field.values.iter().map(|&v| scheme.bin_index(v)).collect()
}

/// Indexed display image: palette entry `i` is display color `i` (opaque)
/// and the entry after the last bin is fully transparent.
pub fn display_palette(
    bins: &[Option<usize>],
    scheme: &ColorScheme,
) -> (Vec<(u8, u8, u8, u8)>, Vec<usize>) {
    let transparent = scheme.num_bins();
    let mut palette: Vec<(u8, u8, u8, u8)> =
        scheme.colors().iter().map(|c| c.with_alpha(255)).collect();
    palette.push((0, 0, 0, 0));

    let indices = bins.iter().map(|bin| bin.unwrap_or(transparent)).collect();
    (palette, indices)
}

fn expand_rgba(palette: &[(u8, u8, u8, u8)], indices: &[usize]) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(indices.len() * 4);
    for &i in indices {
        let (r, g, b, a) = palette[i];
        pixels.extend_from_slice(&[r, g, b, a]);
    }
    pixels
}

fn encode_display_png(
    field: &PixelField,
    bins: &[Option<usize>],
    scheme: &ColorScheme,
    options: &RenderOptions,
) -> DispersionResult<Vec<u8>> {
    let (palette, indices) = display_palette(bins, scheme);

    if options.contour_lines {
        let mut pixels = expand_rgba(&palette, &indices);
        let contours = generate_contours(&field.values, field.width, field.height, scheme.levels());
        draw_contours(
            &mut pixels,
            field.width,
            field.height,
            &contours,
            &options.contour_style,
        )?;
        return create_png_auto(&pixels, field.width, field.height);
    }

    if palette.len() <= MAX_PALETTE_SIZE {
        let indices: Vec<u8> = indices.into_iter().map(|i| i as u8).collect();
        create_png_indexed(field.width, field.height, &palette, &indices)
    } else {
        create_png(&expand_rgba(&palette, &indices), field.width, field.height)
    }
}

/// Render one 2-D slice to `image_path` and any requested exports.
pub fn render(
    slice: &GridSlice,
    scheme: &ColorScheme,
    image_path: &Path,
    exports: &RasterExports,
    options: &RenderOptions,
) -> DispersionResult<RenderResult> {
    let field = resample_slice(slice, options.scale)?;
    let bins = classify_field(&field, scheme);

    let png = encode_display_png(&field, &bins, scheme, options)?;
    write_png(image_path, &png)?;

    let mut written = Vec::new();
    if let Some(path) = &exports.rgba {
        geotiff::write_rgba(path, &field, &bins, scheme)?;
        written.push(path.clone());
    }
    if let Some(path) = &exports.raw {
        geotiff::write_raw(path, &field, scheme)?;
        written.push(path.clone());
    }
    if let Some(path) = &exports.classified {
        geotiff::write_classified(path, &field, &bins, scheme)?;
        written.push(path.clone());
    }

    debug!(
        image = %image_path.display(),
        width = field.width,
        height = field.height,
        exports = written.len(),
        "Rendered slice"
    );

    Ok(RenderResult {
        image_path: image_path.to_path_buf(),
        exports: written,
        width: field.width,
        height: field.height,
        geo_transform: field.geo_transform(),
    })
}
