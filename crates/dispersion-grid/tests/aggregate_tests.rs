//! Integration tests for calendar-local daily aggregation.

use chrono::{Duration, NaiveDate, Timelike, Utc, TimeZone};
use dispersion_common::{DispersionError, GridSpec};
use dispersion_grid::{aggregate, DailyStatistic, RasterSeries};
use test_utils::{create_plume_grid, create_series_buffer};

fn grid(nx: usize, ny: usize) -> GridSpec {
    GridSpec {
        nx,
        ny,
        dx: 0.1,
        dy: -0.1,
        first_x: -120.0,
        first_y: 45.0,
    }
}

fn hourly_series(start_hour: u32, num_times: usize, num_layers: usize, data: Vec<f32>) -> RasterSeries {
    let heights = (0..num_layers).map(|l| ((l + 1) * 10).to_string()).collect();
    RasterSeries::new(
        grid(4, 3),
        heights,
        Utc.with_ymd_and_hms(2020, 8, 13, start_hour, 0, 0).unwrap(),
        Duration::hours(1),
        num_times,
        data,
        false,
    )
    .unwrap()
}

// ============================================================================
// Bucketing
// ============================================================================

#[test]
fn test_utc_minus_five_scenario() {
    let data = create_series_buffer(4, 3, 24, 1, |t, _| t as f32);
    let series = hourly_series(0, 24, 1, data);

    let agg = aggregate(&series, -5).unwrap();

    let expected_start = NaiveDate::from_ymd_opt(2020, 8, 12)
        .unwrap()
        .and_hms_opt(19, 0, 0)
        .unwrap();
    assert_eq!(agg.local_start, expected_start);
    assert_eq!(agg.num_days, 2);
    assert_eq!(agg.bucket_hours, vec![5, 19]);

    // Hours 0..5 then 5..24
    assert_eq!(agg.frame(DailyStatistic::Maximum, 0, 0)[0], 4.0);
    assert_eq!(agg.frame(DailyStatistic::Minimum, 1, 0)[0], 5.0);
    assert_eq!(agg.frame(DailyStatistic::Average, 0, 0)[0], 2.0);
    assert_eq!(agg.frame(DailyStatistic::Average, 1, 0)[0], 14.0);
}

#[test]
fn test_bucket_hours_cover_series_for_every_offset() {
    for start_hour in [0, 7, 13, 23] {
        for num_times in [1, 5, 24, 25, 72] {
            let data = create_series_buffer(4, 3, num_times, 1, |_, _| 1.0);
            let series = hourly_series(start_hour, num_times, 1, data);

            for offset in -23..=23 {
                let agg = aggregate(&series, offset).unwrap();
                let total: usize = agg.bucket_hours.iter().sum();
                assert_eq!(total, num_times, "offset {} start {}", offset, start_hour);
                assert_eq!(
                    agg.num_days as i64,
                    (agg.local_end.date() - agg.local_start.date()).num_days() + 1
                );
                assert_eq!(agg.dates.len(), agg.num_days);
                assert!(agg.bucket_hours.iter().all(|&h| h > 0 && h <= 24));
            }
        }
    }
}

#[test]
fn test_first_date_is_local_start() {
    let data = create_series_buffer(4, 3, 30, 1, |_, _| 1.0);
    let series = hourly_series(6, 30, 1, data);
    let agg = aggregate(&series, 8).unwrap();
    assert_eq!(agg.dates[0], agg.local_start);
    assert_eq!(agg.dates[0].hour(), 14);
    assert_eq!(agg.bucket_hours[0], 10);
}

#[test]
fn test_offset_outside_range_is_invalid_argument() {
    let data = create_series_buffer(4, 3, 2, 1, |_, _| 1.0);
    let series = hourly_series(0, 2, 1, data);
    for offset in [-30, -24, 24, 100] {
        assert!(matches!(
            aggregate(&series, offset),
            Err(DispersionError::InvalidArgument(_))
        ));
    }
}

// ============================================================================
// Statistics
// ============================================================================

#[test]
fn test_max_ge_avg_ge_min() {
    let num_times = 48;
    let mut data = Vec::new();
    for t in 0..num_times {
        for l in 0..2 {
            let peak = ((t * 37 + l * 11) % 97) as f32;
            data.extend(create_plume_grid(4, 3, peak));
        }
    }
    let series = hourly_series(3, num_times, 2, data);

    for offset in [-8, 0, 5] {
        let agg = aggregate(&series, offset).unwrap();
        for day in 0..agg.num_days {
            for layer in 0..2 {
                let max = agg.frame(DailyStatistic::Maximum, day, layer);
                let avg = agg.frame(DailyStatistic::Average, day, layer);
                let min = agg.frame(DailyStatistic::Minimum, day, layer);
                for i in 0..max.len() {
                    assert!(max[i] >= avg[i] - 1e-4, "max < avg at {}", i);
                    assert!(avg[i] >= min[i] - 1e-4, "avg < min at {}", i);
                }
            }
        }
    }
}

#[test]
fn test_layers_are_aggregated_independently() {
    let data = create_series_buffer(4, 3, 24, 2, |t, l| if l == 0 { t as f32 } else { 100.0 });
    let series = hourly_series(0, 24, 2, data);
    let agg = aggregate(&series, 0).unwrap();

    assert_eq!(agg.num_days, 1);
    assert_eq!(agg.frame(DailyStatistic::Maximum, 0, 0)[0], 23.0);
    assert_eq!(agg.frame(DailyStatistic::Maximum, 0, 1)[0], 100.0);
    assert_eq!(agg.frame(DailyStatistic::Minimum, 0, 1)[0], 100.0);
}

#[test]
fn test_multiple_offsets_coexist() {
    let data = create_series_buffer(4, 3, 24, 1, |t, _| t as f32);
    let series = hourly_series(0, 24, 1, data);

    let eastern = aggregate(&series, -5).unwrap();
    let utc = aggregate(&series, 0).unwrap();

    // Neither aggregate disturbs the other
    assert_eq!(eastern.num_days, 2);
    assert_eq!(utc.num_days, 1);
    assert_eq!(utc.frame(DailyStatistic::Maximum, 0, 0)[0], 23.0);
    assert_eq!(eastern.frame(DailyStatistic::Maximum, 0, 0)[0], 4.0);
}
