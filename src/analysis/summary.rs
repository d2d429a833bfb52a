/// Current-conditions and per-day forecast summary for a location.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::WeatherRecord;

/// Latest observed conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location: String,
    pub date: NaiveDate,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub rainfall_mm: f64,
    pub wind_speed_ms: f64,
    pub pressure_hpa: f64,
}

/// Forecast entries for one date, aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    pub avg_temp_c: f64,
    pub total_rain_mm: f64,
    pub max_wind_ms: f64,
    pub avg_humidity_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub current: Option<CurrentConditions>,
    pub forecast: Vec<DailyForecast>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Summarizes the latest recent record and the forecast grouped by date.
///
/// Forecast entries may be sub-daily; all entries sharing a date are folded
/// into one `DailyForecast`. Values are rounded to one decimal place.
pub fn weekly_summary(recent: &[WeatherRecord], forecast: Option<&[WeatherRecord]>) -> WeatherSummary {
    let current = recent.last().map(|r| CurrentConditions {
        location: r.location.clone(),
        date: r.date,
        temperature_c: r.temperature_c,
        humidity_pct: r.humidity_pct,
        rainfall_mm: r.rainfall_mm,
        wind_speed_ms: r.wind_speed_ms,
        pressure_hpa: r.pressure_hpa,
    });

    let mut by_date: BTreeMap<NaiveDate, Vec<&WeatherRecord>> = BTreeMap::new();
    for entry in forecast.unwrap_or_default() {
        by_date.entry(entry.date).or_default().push(entry);
    }

    let forecast = by_date
        .into_iter()
        .map(|(date, entries)| {
            let n = entries.len() as f64;
            let temps = entries.iter().map(|e| e.temperature_c);
            DailyForecast {
                date,
                max_temp_c: round1(temps.clone().fold(f64::MIN, f64::max)),
                min_temp_c: round1(temps.clone().fold(f64::MAX, f64::min)),
                avg_temp_c: round1(temps.sum::<f64>() / n),
                total_rain_mm: round1(entries.iter().map(|e| e.rainfall_mm).sum()),
                max_wind_ms: round1(entries.iter().map(|e| e.wind_speed_ms).fold(f64::MIN, f64::max)),
                avg_humidity_pct: round1(entries.iter().map(|e| e.humidity_pct).sum::<f64>() / n),
            }
        })
        .collect();

    WeatherSummary { current, forecast }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(day: u32, temp: f64, rain: f64, wind: f64, humidity: f64) -> WeatherRecord {
        let date = NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
        WeatherRecord::new("Multan", date, rain, temp, 1001.0, wind, humidity)
    }

    #[test]
    fn test_current_is_latest_recent_record() {
        let recent = vec![entry(1, 30.0, 0.0, 2.0, 40.0), entry(2, 33.0, 1.0, 3.0, 45.0)];
        let summary = weekly_summary(&recent, None);
        let current = summary.current.expect("recent window is not empty");
        assert_eq!(current.date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
        assert_eq!(current.temperature_c, 33.0);
        assert!(summary.forecast.is_empty());
    }

    #[test]
    fn test_forecast_entries_grouped_per_date() {
        let forecast = vec![
            entry(4, 30.0, 2.0, 5.0, 40.0),
            entry(3, 35.0, 0.5, 9.0, 60.0),
            entry(3, 28.0, 1.25, 4.0, 50.0),
        ];
        let summary = weekly_summary(&[], Some(&forecast));
        assert!(summary.current.is_none());
        assert_eq!(summary.forecast.len(), 2);

        let day3 = &summary.forecast[0];
        assert_eq!(day3.date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(day3.max_temp_c, 35.0);
        assert_eq!(day3.min_temp_c, 28.0);
        assert_eq!(day3.avg_temp_c, 31.5);
        assert_eq!(day3.total_rain_mm, 1.8);
        assert_eq!(day3.max_wind_ms, 9.0);
        assert_eq!(day3.avg_humidity_pct, 55.0);
    }
}
