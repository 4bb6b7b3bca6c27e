//! Common test fixtures for dispersion image tests.

/// Common domain extents as `(west, south, east, north)`.
pub mod bbox {
    /// Grid described by `create_ioapi_attributes(6, 4, ..)`
    pub const SMALL_IOAPI: (f64, f64, f64, f64) = (-120.0, 40.0, -119.5, 40.3);
}

/// Color schemes in the shape the configuration provider hands over.
pub mod schemes {
    /// Hex colors of the hourly PM2.5 scheme (first entry is the background)
    pub const PM25_HEX: [&str; 6] = [
        "#000000", "#00E400", "#FFFF00", "#FF7E00", "#FF0000", "#8F3F97",
    ];

    /// The same colors as RGB channels
    pub const PM25_RED: [i64; 6] = [0, 0, 255, 255, 255, 143];
    pub const PM25_GREEN: [i64; 6] = [0, 228, 255, 126, 0, 63];
    pub const PM25_BLUE: [i64; 6] = [0, 0, 0, 0, 0, 151];

    /// Breakpoints for [`PM25_HEX`] (µg/m³)
    pub const PM25_LEVELS: [f64; 7] = [0.0, 1.0, 12.0, 35.0, 55.0, 150.0, 250.0];

    /// Visual range bins, miles; high values are clean air
    pub const VISIBILITY_HEX: [&str; 4] = ["#FFFFFF", "#FF0000", "#FFFF00", "#00E400"];
    pub const VISIBILITY_LEVELS: [f64; 5] = [0.0, 1.0, 5.0, 10.0, 600.0];

    /// Background color shared by the schemes above
    pub const BACKGROUND_HEX: &str = "#000000";

    pub fn hex_colors(colors: &[&str]) -> Vec<String> {
        colors.iter().map(|c| c.to_string()).collect()
    }
}

/// Time values used with the IO/API attribute generator.
pub mod time {
    /// 2014-06-01 as IO/API `YYYYDDD`
    pub const SDATE_2014_06_01: i64 = 2014152;

    /// Midnight as IO/API `HHMMSS`
    pub const STIME_00Z: i64 = 0;
}
