//! Dispersion image builder.
//!
//! Turns one BlueSky dispersion NetCDF file into sets of classified PNG
//! images (and optional GeoTIFF exports) per layer, time series type, UTC
//! offset and color scheme, ready for packaging into map overlays.

pub mod config;
pub mod config_loader;
pub mod image_set;

pub use config::RunConfig;
pub use image_set::{
    build_image_set, AggregateCache, GeotiffExports, ImageSetContext, ImageSetRecord,
    ImageSetSummary, NamedScheme, SchemesBySeries,
};
