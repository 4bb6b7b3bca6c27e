//! Classification and rendering of dispersion grid slices.
//!
//! - [`classify`]: breakpoints and colors, bin lookup, legend variant
//! - [`resample`]: the shared pixel grid every output is drawn from
//! - [`png`]: indexed / RGBA PNG encoding
//! - [`contour`]: optional isoline overlay
//! - [`geotiff`]: RGBA, raw-value and classified GeoTIFF exports (GDAL)
//! - [`legend`]: colorbar images
//! - [`render`]: one call producing the PNG and its exports

pub mod classify;
pub mod contour;
pub mod geotiff;
pub mod legend;
pub mod png;
pub mod render;
pub mod resample;

pub use classify::{ColorMap, ColorScheme, Legend};
pub use legend::render_legend;
pub use render::{render, RasterExports, RenderOptions, RenderResult};
pub use resample::{resample_slice, PixelField};
