//! Common types and utilities shared across the dispersion image workspace.

pub mod bbox;
pub mod color;
pub mod error;
pub mod grid;
pub mod naming;
pub mod series;

pub use bbox::BoundingBox;
pub use color::Rgb;
pub use error::{DispersionError, DispersionResult};
pub use grid::{GridSlice, GridSpec};
pub use naming::{height_label, utc_label, ImageSetKey};
pub use series::TimeSeriesType;
