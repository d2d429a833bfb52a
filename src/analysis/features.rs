/// Feature derivation for per-location daily weather series.
///
/// Turns a date-ordered series into `EnrichedRecord`s: calendar fields,
/// trailing rainfall sums, day-over-day deltas, run-length counters,
/// threshold flags, a monthly pressure baseline and region interaction
/// terms.
///
/// # Ordering
/// Rolling windows are positional (the last *w* records, not the last *w*
/// calendar days) with `min_periods = 1` semantics, so a series must be
/// partitioned by location and sorted by date first. `derive` does that
/// itself; `derive_series` validates it and refuses anything else.

use std::collections::BTreeMap;

use chrono::Datelike;
use tracing::debug;

use crate::analysis::groupings::group_by_location;
use crate::error::Result;
use crate::model::{
    validate_series, EnrichedRecord, Season, WeatherRecord, EXTREME_COLD_C, EXTREME_HEAT_C,
    HEAVY_RAIN_MM, HIGH_HUMIDITY_PCT, RAPID_PRESSURE_DROP_HPA, WET_DAY_MIN_RAIN_MM,
};
use crate::regions::{region_of, Region};

/// Trailing rainfall window sizes, in records.
pub const RAIN_WINDOWS: [usize; 4] = [3, 7, 15, 30];

/// Three-day rainfall (mm) above which a mountain location is at risk of
/// landslides.
const MOUNTAIN_RAIN_RISK_MM: f64 = 100.0;

/// Guards the 7-vs-30 day ratio against a dry month.
const RATIO_EPSILON: f64 = 0.001;

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Derives features for records from any number of locations, in any order.
///
/// Output is grouped by location (in name order) and sorted by date within
/// each location, so calling this twice, or on a shuffled copy of the same
/// input, yields identical results.
pub fn derive(records: Vec<WeatherRecord>) -> Result<Vec<EnrichedRecord>> {
    let grouped = group_by_location(records)?;

    let mut enriched = Vec::new();
    for series in grouped.values() {
        enriched.extend(derive_ordered(series));
    }
    Ok(enriched)
}

/// Derives features for a single location's series.
///
/// The series must be strictly ordered by date and contain only finite
/// readings for one location.
pub fn derive_series(series: &[WeatherRecord]) -> Result<Vec<EnrichedRecord>> {
    validate_series(series)?;
    Ok(derive_ordered(series))
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

fn derive_ordered(series: &[WeatherRecord]) -> Vec<EnrichedRecord> {
    let Some(first) = series.first() else {
        return Vec::new();
    };
    let region = region_of(&first.location);
    debug!(location = %first.location, records = series.len(), region = region.as_str(), "deriving features");

    let rain: Vec<f64> = series.iter().map(|r| r.rainfall_mm).collect();
    let pressure: Vec<f64> = series.iter().map(|r| r.pressure_hpa).collect();
    let temp: Vec<f64> = series.iter().map(|r| r.temperature_c).collect();
    let humidity: Vec<f64> = series.iter().map(|r| r.humidity_pct).collect();

    let [rain_3day, rain_7day, rain_15day, rain_30day] = RAIN_WINDOWS.map(|w| rolling_sum(&rain, w));
    let consecutive = consecutive_wet_days(&rain);
    let pressure_change = day_over_day(&pressure);
    let pressure_trend = three_day_trend(&pressure);
    let temp_change = day_over_day(&temp);
    let temp_trend = three_day_trend(&temp);
    let humidity_change = day_over_day(&humidity);
    let monthly_pressure = monthly_means(series, &pressure);

    series
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let month = record.date.month();
            let monsoon_months = matches!(month, 7..=9);
            let rapid_pressure_drop = pressure_change[i] < RAPID_PRESSURE_DROP_HPA;
            let monthly_avg_pressure = monthly_pressure[&month];

            EnrichedRecord {
                record: record.clone(),

                month,
                day_of_year: record.date.ordinal(),
                week_of_year: record.date.iso_week().week(),
                season: Season::from_month(month),
                is_monsoon_season: monsoon_months,
                is_winter_rain_season: matches!(month, 1..=3),
                is_pre_monsoon: matches!(month, 4..=6),
                is_post_monsoon: matches!(month, 10 | 11),

                region,

                rain_3day: rain_3day[i],
                rain_7day: rain_7day[i],
                rain_15day: rain_15day[i],
                rain_30day: rain_30day[i],
                rain_intensity: record.rainfall_mm / 24.0,
                heavy_rain_day: record.rainfall_mm > HEAVY_RAIN_MM,
                consecutive_rain_days: consecutive[i],
                rain_7day_vs_30day: rain_7day[i] / (rain_30day[i] + RATIO_EPSILON),

                pressure_change: pressure_change[i],
                pressure_3day_trend: pressure_trend[i],
                rapid_pressure_drop,
                monthly_avg_pressure,
                pressure_anomaly: record.pressure_hpa - monthly_avg_pressure,

                temp_change: temp_change[i],
                temp_3day_trend: temp_trend[i],
                extreme_heat: record.temperature_c > EXTREME_HEAT_C,
                extreme_cold: record.temperature_c < EXTREME_COLD_C,

                humidity_change: humidity_change[i],
                high_humidity: record.humidity_pct > HIGH_HUMIDITY_PCT,

                monsoon_rain_7day: if monsoon_months { rain_7day[i] } else { 0.0 },
                coastal_storm_risk: region == Region::Coastal && rapid_pressure_drop,
                mountain_rain_risk: region == Region::Mountain && rain_3day[i] > MOUNTAIN_RAIN_RISK_MM,
            }
        })
        .collect()
}

/// Trailing sum over `max(0, i - window + 1)..=i`. Partial windows at the
/// start of the series are summed as-is.
pub fn rolling_sum(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    values
        .iter()
        .enumerate()
        .map(|(i, _)| values[(i + 1).saturating_sub(window)..=i].iter().sum())
        .collect()
}

/// Run length of consecutive wet days ending at each position. A day with
/// rainfall ≤ 0.1 mm resets the count to 0.
pub fn consecutive_wet_days(rain: &[f64]) -> Vec<u32> {
    rain.iter()
        .scan(0u32, |count, &mm| {
            *count = if mm > WET_DAY_MIN_RAIN_MM { *count + 1 } else { 0 };
            Some(*count)
        })
        .collect()
}

/// `values[i] - values[i - 1]`, with 0.0 for the first record.
pub fn day_over_day(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| if i == 0 { 0.0 } else { v - values[i - 1] })
        .collect()
}

/// `values[i] - values[i - 2]`, with 0.0 until two prior records exist.
pub fn three_day_trend(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| if i < 2 { 0.0 } else { v - values[i - 2] })
        .collect()
}

/// Mean of `values` per calendar month of the series. This is a whole-series
/// aggregate and deliberately looks at every record of the month.
fn monthly_means(series: &[WeatherRecord], values: &[f64]) -> BTreeMap<u32, f64> {
    let mut sums: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for (record, value) in series.iter().zip(values) {
        let entry = sums.entry(record.date.month()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(month, (sum, count))| (month, sum / count as f64))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
