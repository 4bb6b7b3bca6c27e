//! Output directory and file naming shared with the overlay packager.
//!
//! Image files are named
//! `<parameter>_<height>_<series>[_<UTC label>]_<scheme>_<timestamp>.<ext>`.

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

use crate::series::TimeSeriesType;

/// Label for a layer height, e.g. `"100"` → `"100m"`.
pub fn height_label(height: &str) -> String {
    format!("{}m", height)
}

/// `UTC±HHMM` label for a whole-hour offset, e.g. `-5` → `UTC-0500`.
pub fn utc_label(utc_offset: i32) -> String {
    let sign = if utc_offset >= 0 { '+' } else { '-' };
    format!("UTC{}{:02}00", sign, utc_offset.abs())
}

/// Identifies one image set: everything in a file name except the time stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSetKey<'a> {
    pub parameter: &'a str,
    pub height_label: &'a str,
    pub series: TimeSeriesType,
    pub utc_offset: Option<i32>,
    pub scheme: &'a str,
}

impl<'a> ImageSetKey<'a> {
    fn prefix(&self) -> String {
        let mut name = format!(
            "{}_{}_{}",
            self.parameter.to_lowercase(),
            self.height_label,
            self.series.dir_name()
        );
        if let Some(offset) = self.utc_offset {
            name.push('_');
            name.push_str(&utc_label(offset));
        }
        name.push('_');
        name.push_str(self.scheme);
        name
    }

    /// Directory holding this set, relative to the run's output root.
    pub fn directory(&self, root: &Path) -> PathBuf {
        let mut dir = root.join(self.height_label).join(self.series.dir_name());
        if let Some(offset) = self.utc_offset {
            dir.push(utc_label(offset));
        }
        dir.join(self.scheme)
    }

    /// File stem (no extension) for the image at `timestamp`.
    pub fn file_stem(&self, timestamp: &NaiveDateTime) -> String {
        format!(
            "{}_{}",
            self.prefix(),
            timestamp.format(self.series.timestamp_pattern())
        )
    }

    /// File stem of the set's legend image.
    pub fn legend_stem(&self) -> String {
        format!("{}_colorbar", self.prefix())
    }
}
