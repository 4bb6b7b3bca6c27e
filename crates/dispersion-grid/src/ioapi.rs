//! Models-3 IO/API global attributes as exposed by GDAL's netCDF driver.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use dispersion_common::{DispersionError, DispersionResult};

use crate::row_order::RowOrder;

/// Prefix GDAL puts on netCDF global attributes in the default metadata domain.
pub const GLOBAL_PREFIX: &str = "NC_GLOBAL#";

/// IO/API grid type code for a plain lat/lon grid.
pub const GDTYP_LATLON: i64 = 1;

/// Grid, layer and time description of an IO/API file.
#[derive(Debug, Clone, PartialEq)]
pub struct IoapiMetadata {
    pub x_orig: f64,
    pub y_orig: f64,
    pub x_cell: f64,
    pub y_cell: f64,
    pub nrows: usize,
    pub ncols: usize,
    pub nlays: usize,
    /// One label per layer, e.g. `"10"` for the 10 m layer
    pub heights: Vec<String>,
    pub start: DateTime<Utc>,
    pub time_step: Duration,
}

impl IoapiMetadata {
    /// Parse from GDAL `KEY=VALUE` metadata strings.
    pub fn from_metadata_strings<I, S>(items: I) -> DispersionResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let map: HashMap<String, String> = items
            .into_iter()
            .filter_map(|item| {
                item.as_ref()
                    .split_once('=')
                    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            })
            .collect();
        Self::from_map(&map)
    }

    /// Parse from an attribute map keyed with the `NC_GLOBAL#` prefix.
    pub fn from_map(map: &HashMap<String, String>) -> DispersionResult<Self> {
        let attrs = Attributes(map);

        if attrs.raw("IOAPI_VERSION").is_none() {
            return Err(DispersionError::input(
                "Missing IOAPI_VERSION attribute; not a recognized dispersion grid file",
            ));
        }

        let gdtyp: i64 = attrs.parse("GDTYP")?;
        if gdtyp != GDTYP_LATLON {
            return Err(DispersionError::input(format!(
                "Unsupported grid type GDTYP={} (only lat/lon grids are handled)",
                gdtyp
            )));
        }

        let nlays: usize = attrs.parse("NLAYS")?;
        let heights = parse_heights(attrs.require("VGLVLS")?, nlays)?;

        let sdate: i64 = attrs.parse("SDATE")?;
        let stime: i64 = attrs.parse("STIME")?;
        let tstep: i64 = attrs.parse("TSTEP")?;

        Ok(Self {
            x_orig: attrs.parse("XORIG")?,
            y_orig: attrs.parse("YORIG")?,
            x_cell: attrs.parse("XCELL")?,
            y_cell: attrs.parse("YCELL")?,
            nrows: attrs.parse("NROWS")?,
            ncols: attrs.parse("NCOLS")?,
            nlays,
            heights,
            start: parse_start(sdate, stime)?,
            time_step: Duration::hours(tstep / 10000),
        })
    }

    pub fn geo_transform(&self, row_order: RowOrder) -> [f64; 6] {
        row_order.geo_transform(self.x_orig, self.y_orig, self.x_cell, self.y_cell, self.nrows)
    }
}

struct Attributes<'a>(&'a HashMap<String, String>);

impl Attributes<'_> {
    fn raw(&self, name: &str) -> Option<&str> {
        self.0
            .get(&format!("{}{}", GLOBAL_PREFIX, name))
            .map(String::as_str)
    }

    fn require(&self, name: &str) -> DispersionResult<&str> {
        self.raw(name)
            .ok_or_else(|| DispersionError::input(format!("Missing attribute {}{}", GLOBAL_PREFIX, name)))
    }

    fn parse<T: FromStr>(&self, name: &str) -> DispersionResult<T> {
        let raw = self.require(name)?;
        raw.trim().parse().map_err(|_| {
            DispersionError::input(format!("Malformed attribute {}: {:?}", name, raw))
        })
    }
}

/// `{10,0}` -> `["10"]` for one layer. VGLVLS holds layer boundaries, so it
/// has one more entry than there are layers.
fn parse_heights(vglvls: &str, nlays: usize) -> DispersionResult<Vec<String>> {
    let heights: Vec<String> = vglvls
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .split(',')
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .take(nlays)
        .collect();

    if heights.len() < nlays {
        return Err(DispersionError::input(format!(
            "VGLVLS {:?} has fewer than {} layer heights",
            vglvls, nlays
        )));
    }
    Ok(heights)
}

/// SDATE is `YYYYDDD`, STIME is `HHMMSS` (minutes and seconds ignored).
fn parse_start(sdate: i64, stime: i64) -> DispersionResult<DateTime<Utc>> {
    let year = i32::try_from(sdate / 1000)
        .map_err(|_| DispersionError::input(format!("Bad SDATE {}", sdate)))?;
    let ordinal = u32::try_from(sdate % 1000)
        .map_err(|_| DispersionError::input(format!("Bad SDATE {}", sdate)))?;
    let date = NaiveDate::from_yo_opt(year, ordinal)
        .ok_or_else(|| DispersionError::input(format!("Bad SDATE {}", sdate)))?;

    let hour = u32::try_from(stime / 10000)
        .map_err(|_| DispersionError::input(format!("Bad STIME {}", stime)))?;
    let naive = date
        .and_hms_opt(hour, 0, 0)
        .ok_or_else(|| DispersionError::input(format!("Bad STIME {}", stime)))?;

    Ok(Utc.from_utc_datetime(&naive))
}
