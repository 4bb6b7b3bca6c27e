//! Time series types rendered for each layer and color scheme.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of image series produced from one dispersion grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSeriesType {
    Hourly,
    ThreeHour,
    DailyMaximum,
    DailyMinimum,
    DailyAverage,
}

impl TimeSeriesType {
    pub const ALL: [TimeSeriesType; 5] = [
        TimeSeriesType::Hourly,
        TimeSeriesType::ThreeHour,
        TimeSeriesType::DailyMaximum,
        TimeSeriesType::DailyMinimum,
        TimeSeriesType::DailyAverage,
    ];

    /// Directory and file-name key of the series.
    pub fn dir_name(&self) -> &'static str {
        match self {
            TimeSeriesType::Hourly => "hourly",
            TimeSeriesType::ThreeHour => "three_hour",
            TimeSeriesType::DailyMaximum => "daily_maximum",
            TimeSeriesType::DailyMinimum => "daily_minimum",
            TimeSeriesType::DailyAverage => "daily_average",
        }
    }

    /// "Daily Maximum" style name for legends and logs.
    pub fn pretty_name(&self) -> String {
        self.dir_name()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_daily(&self) -> bool {
        matches!(
            self,
            TimeSeriesType::DailyMaximum | TimeSeriesType::DailyMinimum | TimeSeriesType::DailyAverage
        )
    }

    /// strftime pattern for file-name time stamps.
    pub fn timestamp_pattern(&self) -> &'static str {
        if self.is_daily() {
            "%Y%m%d"
        } else {
            "%Y%m%d%H%M"
        }
    }

    /// Series rendered for a parameter: daily minimum only for visibility,
    /// daily maximum only for everything else.
    pub fn all_for_parameter(is_visibility: bool) -> Vec<TimeSeriesType> {
        Self::ALL
            .into_iter()
            .filter(|t| match t {
                TimeSeriesType::DailyMinimum => is_visibility,
                TimeSeriesType::DailyMaximum => !is_visibility,
                _ => true,
            })
            .collect()
    }
}

impl fmt::Display for TimeSeriesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}
