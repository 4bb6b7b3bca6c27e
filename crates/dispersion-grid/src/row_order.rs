//! Row order of NetCDF bands as returned by GDAL.
//!
//! GDAL's netCDF driver changed behavior in 1.9: newer versions return rows
//! north-up, older versions bottom-up. The geotransform has to match or every
//! image comes out vertically flipped.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Orientation of the rows GDAL hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrder {
    /// Row 0 is the northern edge (GDAL >= 1.9)
    NorthUp,
    /// Row 0 is the southern edge (GDAL < 1.9)
    SouthUp,
}

impl RowOrder {
    /// Parse `GDAL 3.6.2, released 2023/01/02` style version text.
    pub fn from_version_text(text: &str) -> Option<RowOrder> {
        let version = text.trim().strip_prefix("GDAL ")?;
        let version = version.split(',').next()?.trim();

        let mut parts = version.split('.');
        let major: u32 = parts.next()?.parse().ok()?;
        let minor: u32 = parts.next()?.trim_end_matches(|c: char| !c.is_ascii_digit()).parse().ok()?;

        if major > 1 || (major == 1 && minor >= 9) {
            Some(RowOrder::NorthUp)
        } else {
            Some(RowOrder::SouthUp)
        }
    }

    /// Ask the linked GDAL library.
    ///
    /// Falls back to [`RowOrder::SouthUp`] when the version cannot be read.
    pub fn detect() -> RowOrder {
        let text = gdal::version::version_info("--version");
        match Self::from_version_text(&text) {
            Some(order) => {
                debug!(version = %text, ?order, "Detected GDAL row order");
                order
            }
            None => {
                warn!(
                    version = %text,
                    "Could not determine GDAL version; assuming bottom-up rows"
                );
                RowOrder::SouthUp
            }
        }
    }

    /// Affine transform for an IO/API grid whose lower-left grid point is (x0, y0).
    pub fn geo_transform(&self, x0: f64, y0: f64, dx: f64, dy: f64, nrows: usize) -> [f64; 6] {
        match self {
            RowOrder::NorthUp => {
                let top = y0 + nrows.saturating_sub(1) as f64 * dy;
                [x0, dx, 0.0, top, 0.0, -dy]
            }
            RowOrder::SouthUp => [x0, dx, 0.0, y0, 0.0, dy],
        }
    }
}

/// Configured row order: detect from the GDAL version, or force one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrderSetting {
    #[default]
    Auto,
    NorthUp,
    SouthUp,
}

impl RowOrderSetting {
    pub fn resolve(&self) -> RowOrder {
        match self {
            RowOrderSetting::Auto => RowOrder::detect(),
            RowOrderSetting::NorthUp => RowOrder::NorthUp,
            RowOrderSetting::SouthUp => RowOrder::SouthUp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modern_versions_are_north_up() {
        assert_eq!(
            RowOrder::from_version_text("GDAL 3.6.2, released 2023/01/02"),
            Some(RowOrder::NorthUp)
        );
        assert_eq!(
            RowOrder::from_version_text("GDAL 1.9.0, released 2011/12/29"),
            Some(RowOrder::NorthUp)
        );
        assert_eq!(
            RowOrder::from_version_text("GDAL 3.9.0dev-abc, released 2024/01/01"),
            Some(RowOrder::NorthUp)
        );
    }

    #[test]
    fn test_old_versions_are_south_up() {
        assert_eq!(
            RowOrder::from_version_text("GDAL 1.8.1, released 2011/07/09"),
            Some(RowOrder::SouthUp)
        );
    }

    #[test]
    fn test_unparsable_version() {
        assert_eq!(RowOrder::from_version_text(""), None);
        assert_eq!(RowOrder::from_version_text("gdal unknown"), None);
        assert_eq!(RowOrder::from_version_text("GDAL x.y"), None);
    }

    #[test]
    fn test_geo_transforms() {
        let gt = RowOrder::NorthUp.geo_transform(-120.0, 30.0, 0.5, 0.25, 5);
        assert_eq!(gt, [-120.0, 0.5, 0.0, 31.0, 0.0, -0.25]);

        let gt = RowOrder::SouthUp.geo_transform(-120.0, 30.0, 0.5, 0.25, 5);
        assert_eq!(gt, [-120.0, 0.5, 0.0, 30.0, 0.0, 0.25]);
    }

    #[test]
    fn test_forced_settings() {
        assert_eq!(RowOrderSetting::NorthUp.resolve(), RowOrder::NorthUp);
        assert_eq!(RowOrderSetting::SouthUp.resolve(), RowOrder::SouthUp);
    }
}
