//! Dispersion grid loading and time aggregation.
//!
//! Reads BlueSky dispersion output (NetCDF following the Models-3 IO/API
//! convention) into a [`RasterSeries`] of `[time, layer, row, col]` values,
//! and derives calendar-local daily statistics from it.
//!
//! # IO/API layout
//!
//! The concentration variable (e.g. `PM25`) is dimensioned
//! `[TSTEP, LAY, ROW, COL]`. GDAL exposes it as `TSTEP * LAY` bands with the
//! layer index varying fastest. Georeferencing and time information live in
//! global attributes (`XORIG`, `XCELL`, `SDATE`, `STIME`, `TSTEP`, ...).

pub mod aggregate;
pub mod ioapi;
pub mod loader;
pub mod row_order;
pub mod series;
pub mod visibility;

pub use aggregate::{aggregate, three_hour_average, AggregateSet, DailyStatistic};
pub use ioapi::IoapiMetadata;
pub use loader::load;
pub use row_order::{RowOrder, RowOrderSetting};
pub use series::RasterSeries;
pub use visibility::{is_visual_range, VISIBILITY_CONSTANT};
