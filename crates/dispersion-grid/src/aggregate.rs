//! Calendar-local daily statistics.
//!
//! Hours are shifted by a UTC offset and bucketed by local calendar day. The
//! first bucket runs from the first local hour to local midnight, later
//! buckets are whole days, and the last one ends with the data.

use chrono::{Duration, NaiveDateTime, Timelike};
use dispersion_common::{DispersionError, DispersionResult, GridSlice, GridSpec, TimeSeriesType};
use tracing::{debug, warn};

use crate::series::RasterSeries;

/// Which daily reduction to read from an [`AggregateSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DailyStatistic {
    Maximum,
    Minimum,
    Average,
}

impl DailyStatistic {
    /// Statistic backing a daily series type, `None` for sub-daily series.
    pub fn for_series(series: TimeSeriesType) -> Option<DailyStatistic> {
        match series {
            TimeSeriesType::DailyMaximum => Some(DailyStatistic::Maximum),
            TimeSeriesType::DailyMinimum => Some(DailyStatistic::Minimum),
            TimeSeriesType::DailyAverage => Some(DailyStatistic::Average),
            TimeSeriesType::Hourly | TimeSeriesType::ThreeHour => None,
        }
    }
}

/// Daily max/min/mean of every layer for one UTC offset.
#[derive(Debug, Clone)]
pub struct AggregateSet {
    pub utc_offset: i32,
    /// First and last hour of the series in local time
    pub local_start: NaiveDateTime,
    pub local_end: NaiveDateTime,
    pub num_days: usize,
    /// Local start of each day; the first keeps the local start hour
    pub dates: Vec<NaiveDateTime>,
    /// Number of hourly steps in each day's bucket
    pub bucket_hours: Vec<usize>,
    grid: GridSpec,
    num_layers: usize,
    maximum: Vec<f32>,
    minimum: Vec<f32>,
    average: Vec<f32>,
}

impl AggregateSet {
    pub fn num_layers(&self) -> usize {
        self.num_layers
    }

    /// One day and layer of a statistic, row-major in series row order.
    pub fn frame(&self, stat: DailyStatistic, day: usize, layer: usize) -> &[f32] {
        let len = self.grid.len();
        let offset = (day * self.num_layers + layer) * len;
        let data = match stat {
            DailyStatistic::Maximum => &self.maximum,
            DailyStatistic::Minimum => &self.minimum,
            DailyStatistic::Average => &self.average,
        };
        &data[offset..offset + len]
    }

    pub fn slice(&self, stat: DailyStatistic, day: usize, layer: usize) -> DispersionResult<GridSlice> {
        if day >= self.num_days || layer >= self.num_layers {
            return Err(DispersionError::InvalidArgument(format!(
                "Day {} layer {} outside aggregate of {} days x {} layers",
                day, layer, self.num_days, self.num_layers
            )));
        }
        Ok(GridSlice::new(self.grid, self.frame(stat, day, layer).to_vec()))
    }
}

/// Bucket the series into local calendar days for `utc_offset` hours.
///
/// Offsets must lie strictly between -24 and 24.
pub fn aggregate(series: &RasterSeries, utc_offset: i32) -> DispersionResult<AggregateSet> {
    if utc_offset <= -24 || utc_offset >= 24 {
        return Err(DispersionError::InvalidArgument(format!(
            "UTC offset {} outside (-24, 24)",
            utc_offset
        )));
    }
    if series.time_step() != Duration::hours(1) {
        warn!(
            step_minutes = series.time_step().num_minutes(),
            "Daily aggregation assumes hourly steps"
        );
    }

    let num_times = series.num_times();
    let num_layers = series.num_layers();
    let grid = *series.grid();
    let frame_len = grid.len();

    let local_start = series.start().naive_utc() + Duration::hours(utc_offset as i64);
    let local_end = local_start + Duration::hours(num_times.saturating_sub(1) as i64);
    let num_days = if num_times == 0 {
        0
    } else {
        (local_end.date() - local_start.date()).num_days() as usize + 1
    };
    let dates: Vec<NaiveDateTime> = (0..num_days)
        .map(|day| local_start + Duration::days(day as i64))
        .collect();

    let total = num_days * num_layers * frame_len;
    let mut maximum = vec![f32::NAN; total];
    let mut minimum = vec![f32::NAN; total];
    let mut average = vec![f32::NAN; total];
    let mut bucket_hours = Vec::with_capacity(num_days);

    let mut first_hour = 0usize;
    let mut end_hour = (24 - local_start.hour() as usize).min(num_times);
    for day in 0..num_days {
        bucket_hours.push(end_hour - first_hour);

        for layer in 0..num_layers {
            let offset = (day * num_layers + layer) * frame_len;
            reduce_bucket(
                series,
                layer,
                first_hour..end_hour,
                &mut maximum[offset..offset + frame_len],
                &mut minimum[offset..offset + frame_len],
                &mut average[offset..offset + frame_len],
            );
        }

        first_hour = end_hour;
        end_hour = (end_hour + 24).min(num_times);
    }

    debug!(
        utc_offset,
        num_days,
        ?bucket_hours,
        local_start = %local_start,
        "Aggregated daily statistics"
    );

    Ok(AggregateSet {
        utc_offset,
        local_start,
        local_end,
        num_days,
        dates,
        bucket_hours,
        grid,
        num_layers,
        maximum,
        minimum,
        average,
    })
}

fn reduce_bucket(
    series: &RasterSeries,
    layer: usize,
    hours: std::ops::Range<usize>,
    maximum: &mut [f32],
    minimum: &mut [f32],
    average: &mut [f32],
) {
    let count = hours.len();
    if count == 0 {
        return;
    }

    let mut sum = vec![0.0f64; maximum.len()];
    for (n, time) in hours.enumerate() {
        let frame = series.frame(time, layer);
        for (i, &v) in frame.iter().enumerate() {
            if n == 0 {
                maximum[i] = v;
                minimum[i] = v;
            } else {
                maximum[i] = nan_max(maximum[i], v);
                minimum[i] = nan_min(minimum[i], v);
            }
            sum[i] += v as f64;
        }
    }

    for (avg, s) in average.iter_mut().zip(sum) {
        *avg = (s / count as f64) as f32;
    }
}

// A NaN hour poisons every statistic of its cell, not only the average.
fn nan_max(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() {
        f32::NAN
    } else {
        a.max(b)
    }
}

fn nan_min(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() {
        f32::NAN
    } else {
        a.min(b)
    }
}

/// Centred three-hour mean around `time` for one layer.
///
/// Valid for `1 <= time <= num_times - 2`.
pub fn three_hour_average(
    series: &RasterSeries,
    time: usize,
    layer: usize,
) -> DispersionResult<GridSlice> {
    if time == 0 || time + 1 >= series.num_times() || layer >= series.num_layers() {
        return Err(DispersionError::InvalidArgument(format!(
            "No centred three-hour window at time {} layer {} ({} times x {} layers)",
            time,
            layer,
            series.num_times(),
            series.num_layers()
        )));
    }

    let (before, at, after) = (
        series.frame(time - 1, layer),
        series.frame(time, layer),
        series.frame(time + 1, layer),
    );
    let values = before
        .iter()
        .zip(at)
        .zip(after)
        .map(|((a, b), c)| ((*a as f64 + *b as f64 + *c as f64) / 3.0) as f32)
        .collect();

    Ok(GridSlice::new(*series.grid(), values))
}
