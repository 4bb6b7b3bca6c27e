//! Colorbar images for image-set legends.
//!
//! A horizontal bar with one swatch per legend bin, the breakpoint at the
//! left edge of each swatch written underneath, and a caption naming the
//! parameter below the labels.

use std::path::Path;

use dispersion_common::{DispersionError, DispersionResult};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use tracing::{debug, warn};

use crate::classify::{ColorScheme, Legend};
use crate::png::{create_png_auto, write_png};

/// Embedded font data - DejaVu Sans Mono
const FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// Width of one color swatch in pixels
pub const SWATCH_WIDTH: usize = 40;

/// Height of the bar in pixels
pub const BAR_HEIGHT: usize = 20;

/// Blank columns left and right of the bar so edge labels fit
pub const MARGIN: usize = 24;

/// Blank rows above the bar
pub const BAR_TOP: usize = 6;

/// Height of the tick label row
pub const LABEL_ROW: usize = 18;

/// Height of the caption row
pub const CAPTION_ROW: usize = 20;

const FONT_SIZE: f32 = 12.0;

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Colorbar image size for a legend of `bins` swatches.
pub fn colorbar_size(bins: usize) -> (usize, usize) {
    (
        2 * MARGIN + bins * SWATCH_WIDTH + 1,
        BAR_TOP + BAR_HEIGHT + LABEL_ROW + CAPTION_ROW,
    )
}

/// Tick text for a breakpoint: integers without a decimal point.
pub fn format_level(level: f64) -> String {
    if level.fract() == 0.0 && level.abs() < 1e15 {
        format!("{}", level as i64)
    } else {
        format!("{}", level)
    }
}

/// Swatches with a black outline around the bar and between swatches.
fn draw_bar(img: &mut RgbaImage, legend: &Legend) {
    let bar_width = legend.colors.len() * SWATCH_WIDTH + 1;
    for y in BAR_TOP..BAR_TOP + BAR_HEIGHT {
        for dx in 0..bar_width {
            let border = y == BAR_TOP || y == BAR_TOP + BAR_HEIGHT - 1 || dx % SWATCH_WIDTH == 0;
            let pixel = if border {
                INK
            } else {
                let (r, g, b, a) = legend.colors[dx / SWATCH_WIDTH].with_alpha(255);
                Rgba([r, g, b, a])
            };
            img.put_pixel((MARGIN + dx) as u32, y as u32, pixel);
        }
    }
}

fn draw_centered(img: &mut RgbaImage, font: &Font<'_>, text: &str, center_x: i32, top: i32) {
    let scale = Scale::uniform(FONT_SIZE);
    let (text_width, _) = text_size(scale, font, text);
    let x = (center_x - text_width / 2).max(0);
    draw_text_mut(img, INK, x, top, scale, font, text);
}

/// Lay out the full colorbar: bar, tick labels and caption.
pub fn draw_colorbar(legend: &Legend, caption: &str) -> DispersionResult<RgbaImage> {
    let font = Font::try_from_bytes(FONT_DATA)
        .ok_or_else(|| DispersionError::render("Failed to load embedded colorbar font"))?;

    let (width, height) = colorbar_size(legend.colors.len());
    let mut img = RgbaImage::from_pixel(width as u32, height as u32, PAPER);
    draw_bar(&mut img, legend);

    let label_top = (BAR_TOP + BAR_HEIGHT + 2) as i32;
    for (i, level) in legend.levels.iter().take(legend.colors.len()).enumerate() {
        let x = (MARGIN + i * SWATCH_WIDTH) as i32;
        draw_centered(&mut img, &font, &format_level(*level), x, label_top);
    }

    if !caption.is_empty() {
        let caption_top = (BAR_TOP + BAR_HEIGHT + LABEL_ROW + 2) as i32;
        draw_centered(&mut img, &font, caption, width as i32 / 2, caption_top);
    }

    Ok(img)
}

/// Write the colorbar for `scheme`, skipping schemes with no legend bins.
///
/// Returns the image size when a file was written.
pub fn render_legend(
    scheme: &ColorScheme,
    caption: &str,
    path: &Path,
) -> DispersionResult<Option<(usize, usize)>> {
    let legend = scheme.legend();
    if legend.is_empty() {
        warn!(path = %path.display(), "Color scheme has a single bin; no colorbar written");
        return Ok(None);
    }

    let img = draw_colorbar(&legend, caption)?;
    let (width, height) = (img.width() as usize, img.height() as usize);

    let png = create_png_auto(img.as_raw(), width, height)?;
    write_png(path, &png)?;

    debug!(path = %path.display(), bins = legend.colors.len(), caption, "Wrote colorbar");
    Ok(Some((width, height)))
}
