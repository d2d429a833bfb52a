//! Real-time hazard alerts: heatwave, cold wave and storm / wind / rain.
//!
//! Three independent checks run over a short recent window (the last seven
//! days at most) and an optional forecast (about five days). Each check
//! yields at most one alert, and current conditions always take priority
//! over the forecast within a check. The collected alerts are ordered by
//! severity; checks of equal severity keep evaluation order.
//!
//! Validity windows are anchored on the data, not the wall clock: the latest
//! recent date, or the day before the first forecast date when there is no
//! recent window. This keeps evaluation deterministic in tests.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::groupings::tail;
use crate::error::Result;
use crate::model::{validate_series, WeatherRecord};

// ---------------------------------------------------------------------------
// Alert types
// ---------------------------------------------------------------------------

/// Alert severity tiers, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    Critical,
    High,
    Moderate,
}

impl AlertSeverity {
    /// Sort rank: CRITICAL 0, HIGH 1, MODERATE 2.
    pub fn rank(&self) -> u8 {
        match self {
            AlertSeverity::Critical => 0,
            AlertSeverity::High => 1,
            AlertSeverity::Moderate => 2,
        }
    }

    /// Whether the alert's actions feed into flood recommendations.
    pub fn is_actionable(&self) -> bool {
        matches!(self, AlertSeverity::Critical | AlertSeverity::High)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Critical => "CRITICAL",
            AlertSeverity::High => "HIGH",
            AlertSeverity::Moderate => "MODERATE",
        }
    }
}

/// The hazard an alert describes, with the readings that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "alert_type", rename_all = "snake_case")]
pub enum AlertKind {
    /// Observed heat; `temperature_c` is the window maximum.
    Heatwave { temperature_c: f64, hot_days: u32 },
    HeatwaveForecast { temperature_c: f64, hot_days: u32 },
    /// Observed cold; `temperature_c` is the three-day minimum.
    ColdWave { temperature_c: f64 },
    ColdWaveForecast { temperature_c: f64 },
    Storm { wind_speed_ms: f64, pressure_change_hpa: f64 },
    HighWind { wind_speed_ms: f64 },
    StormForecast { wind_speed_ms: f64 },
    HeavyRainForecast { rainfall_mm: f64 },
}

impl AlertKind {
    /// Display label, e.g. `"HEATWAVE (FORECAST)"`.
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::Heatwave { .. } => "HEATWAVE",
            AlertKind::HeatwaveForecast { .. } => "HEATWAVE (FORECAST)",
            AlertKind::ColdWave { .. } => "COLD WAVE",
            AlertKind::ColdWaveForecast { .. } => "COLD WAVE (FORECAST)",
            AlertKind::Storm { .. } => "STORM",
            AlertKind::HighWind { .. } => "HIGH WIND",
            AlertKind::StormForecast { .. } => "STORM (FORECAST)",
            AlertKind::HeavyRainForecast { .. } => "HEAVY RAIN (FORECAST)",
        }
    }

    pub fn is_forecast(&self) -> bool {
        matches!(
            self,
            AlertKind::HeatwaveForecast { .. }
                | AlertKind::ColdWaveForecast { .. }
                | AlertKind::StormForecast { .. }
                | AlertKind::HeavyRainForecast { .. }
        )
    }
}

/// A single hazard alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(flatten)]
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    /// Recommended actions, most important first.
    pub actions: Vec<String>,
}

impl Alert {
    fn new(kind: AlertKind, severity: AlertSeverity, message: String, actions: &[&str]) -> Self {
        Alert {
            kind,
            severity,
            message,
            valid_from: None,
            valid_until: None,
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn valid(mut self, from: NaiveDate, until: Option<NaiveDate>) -> Self {
        self.valid_from = Some(from);
        self.valid_until = until;
        self
    }
}

// ---------------------------------------------------------------------------
// Action lists
// ---------------------------------------------------------------------------

const HEAT_CRITICAL_ACTIONS: &[&str] = &[
    "Avoid outdoor activities",
    "Stay hydrated",
    "Never leave children/pets in vehicles",
    "Use fans/air conditioning",
    "Check on elderly and vulnerable neighbors",
];

const HEAT_HIGH_ACTIONS: &[&str] = &[
    "Limit outdoor activities",
    "Stay hydrated",
    "Wear light clothing",
    "Take frequent breaks in shade",
];

const HEAT_FORECAST_ACTIONS: &[&str] = &[
    "Prepare for hot weather",
    "Stock up on water",
    "Check air conditioning",
    "Plan activities for cooler times",
];

const COLD_CRITICAL_ACTIONS: &[&str] = &[
    "Stay indoors if possible",
    "Wear warm clothing",
    "Protect pipes from freezing",
    "Check on elderly neighbors",
];

const COLD_HIGH_ACTIONS: &[&str] = &["Dress in layers", "Limit time outdoors", "Keep warm indoors"];

const COLD_FORECAST_ACTIONS: &[&str] = &[
    "Prepare for cold weather",
    "Stock warm clothing",
    "Protect pipes",
    "Check heating systems",
];

const STORM_ACTIONS: &[&str] = &[
    "Take shelter immediately",
    "Secure outdoor objects",
    "Avoid windows",
    "Stay away from trees and power lines",
];

const HIGH_WIND_ACTIONS: &[&str] = &["Stay indoors", "Secure outdoor items", "Avoid travel"];

const STORM_FORECAST_ACTIONS: &[&str] = &[
    "Prepare for strong winds",
    "Secure outdoor items",
    "Check emergency supplies",
];

const HEAVY_RAIN_FORECAST_ACTIONS: &[&str] = &[
    "Prepare for possible flooding",
    "Clear drainage areas",
    "Monitor weather updates",
];

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Alert thresholds. Defaults are the operational values; a deployment may
/// override any of them through the `[alerts]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Days of recent history examined by the heatwave check.
    pub heat_window_days: usize,
    pub severe_heat_c: f64,
    pub moderate_heat_c: f64,
    /// Hot days needed in the window (or forecast) to raise a heatwave.
    pub min_hot_days: u32,
    /// Days of recent history examined by the cold wave check.
    pub cold_window_days: usize,
    pub freezing_c: f64,
    pub cold_c: f64,
    pub storm_pressure_drop_hpa: f64,
    pub storm_wind_ms: f64,
    pub high_wind_ms: f64,
    pub forecast_heavy_rain_mm: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            heat_window_days: 7,
            severe_heat_c: 40.0,
            moderate_heat_c: 35.0,
            min_hot_days: 3,
            cold_window_days: 3,
            freezing_c: 0.0,
            cold_c: 5.0,
            storm_pressure_drop_hpa: -5.0,
            storm_wind_ms: 15.0,
            high_wind_ms: 20.0,
            forecast_heavy_rain_mm: 100.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Forecast days
// ---------------------------------------------------------------------------

/// One forecast date with its sub-daily entries folded together.
#[derive(Debug, Clone, PartialEq)]
struct ForecastDay {
    date: NaiveDate,
    max_temp_c: f64,
    min_temp_c: f64,
    max_wind_ms: f64,
    rain_mm: f64,
}

/// Folds forecast entries into one `ForecastDay` per date, in date order.
/// Providers may send several entries per date (e.g. 3-hourly).
fn forecast_days(entries: &[WeatherRecord]) -> Vec<ForecastDay> {
    let mut by_date: BTreeMap<NaiveDate, ForecastDay> = BTreeMap::new();
    for e in entries {
        let day = by_date.entry(e.date).or_insert(ForecastDay {
            date: e.date,
            max_temp_c: f64::MIN,
            min_temp_c: f64::MAX,
            max_wind_ms: f64::MIN,
            rain_mm: 0.0,
        });
        day.max_temp_c = day.max_temp_c.max(e.temperature_c);
        day.min_temp_c = day.min_temp_c.min(e.temperature_c);
        day.max_wind_ms = day.max_wind_ms.max(e.wind_speed_ms);
        day.rain_mm += e.rainfall_mm;
    }
    by_date.into_values().collect()
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Evaluates hazard checks against a recent window and optional forecast.
#[derive(Debug, Clone, Default)]
pub struct AlertEngine {
    thresholds: AlertThresholds,
}

impl AlertEngine {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    /// Runs the heatwave, cold wave and storm checks and returns the alerts
    /// sorted by severity.
    ///
    /// `recent` must be a single location's date-ordered series; only its
    /// last seven records are used. Forecast entries may be sub-daily; they
    /// are folded per date, so thresholds count forecast days, not entries.
    /// An empty window or a missing forecast is not an error; the affected
    /// checks are skipped.
    pub fn evaluate(&self, recent: &[WeatherRecord], forecast: Option<&[WeatherRecord]>) -> Result<Vec<Alert>> {
        validate_series(recent)?;
        let forecast = match forecast {
            Some(entries) if !entries.is_empty() => {
                for entry in entries {
                    entry.validate()?;
                }
                Some(forecast_days(entries))
            }
            _ => None,
        };
        let forecast = forecast.as_deref();

        let recent = tail(recent, self.thresholds.heat_window_days.max(self.thresholds.cold_window_days));
        let anchor = recent
            .last()
            .map(|r| r.date)
            .or_else(|| forecast.and_then(|days| days.first()).map(|d| d.date - Duration::days(1)));

        let Some(anchor) = anchor else {
            return Ok(Vec::new());
        };

        let mut alerts: Vec<Alert> = [
            self.check_heatwave(recent, forecast, anchor),
            self.check_coldwave(recent, forecast, anchor),
            self.check_storm(recent, forecast, anchor),
        ]
        .into_iter()
        .flatten()
        .collect();

        // stable: equal ranks keep heatwave, coldwave, storm order
        alerts.sort_by_key(|a| a.severity.rank());

        debug!(alerts = alerts.len(), anchor = %anchor, "evaluated hazard checks");
        Ok(alerts)
    }

    fn check_heatwave(
        &self,
        recent: &[WeatherRecord],
        forecast: Option<&[ForecastDay]>,
        anchor: NaiveDate,
    ) -> Option<Alert> {
        let t = &self.thresholds;

        if recent.len() >= 3 {
            let temps: Vec<f64> = tail(recent, t.heat_window_days).iter().map(|r| r.temperature_c).collect();
            let max_temp = temps.iter().copied().fold(f64::MIN, f64::max);
            let severe_days = temps.iter().filter(|&&c| c > t.severe_heat_c).count() as u32;
            let moderate_days = temps.iter().filter(|&&c| c > t.moderate_heat_c).count() as u32;

            if severe_days >= t.min_hot_days {
                let alert = Alert::new(
                    AlertKind::Heatwave { temperature_c: max_temp, hot_days: severe_days },
                    AlertSeverity::Critical,
                    format!(
                        "CRITICAL HEATWAVE! Temperature above {:.0}°C for {} days.",
                        t.severe_heat_c, severe_days
                    ),
                    HEAT_CRITICAL_ACTIONS,
                );
                return Some(alert.valid(anchor, Some(anchor + Duration::days(severe_days as i64))));
            }
            if moderate_days >= t.min_hot_days {
                let alert = Alert::new(
                    AlertKind::Heatwave { temperature_c: max_temp, hot_days: moderate_days },
                    AlertSeverity::High,
                    format!(
                        "HIGH HEATWAVE ALERT! Temperature above {:.0}°C for {} days.",
                        t.moderate_heat_c, moderate_days
                    ),
                    HEAT_HIGH_ACTIONS,
                );
                return Some(alert.valid(anchor, Some(anchor + Duration::days(moderate_days as i64))));
            }
        }

        let forecast = forecast?;
        let max_temp = forecast.iter().map(|d| d.max_temp_c).fold(f64::MIN, f64::max);
        let hot_days = forecast.iter().filter(|d| d.max_temp_c > t.moderate_heat_c).count() as u32;

        if hot_days >= t.min_hot_days && max_temp > t.moderate_heat_c {
            let severity = if max_temp > t.severe_heat_c {
                AlertSeverity::High
            } else {
                AlertSeverity::Moderate
            };
            let alert = Alert::new(
                AlertKind::HeatwaveForecast { temperature_c: max_temp, hot_days },
                severity,
                format!("Heatwave expected in the coming days! Temperatures up to {:.1}°C.", max_temp),
                HEAT_FORECAST_ACTIONS,
            );
            return Some(alert.valid(anchor + Duration::days(1), Some(anchor + Duration::days(hot_days as i64))));
        }
        None
    }

    fn check_coldwave(
        &self,
        recent: &[WeatherRecord],
        forecast: Option<&[ForecastDay]>,
        anchor: NaiveDate,
    ) -> Option<Alert> {
        let t = &self.thresholds;

        if recent.len() >= 3 {
            let min_temp = tail(recent, t.cold_window_days)
                .iter()
                .map(|r| r.temperature_c)
                .fold(f64::MAX, f64::min);

            if min_temp < t.freezing_c {
                let alert = Alert::new(
                    AlertKind::ColdWave { temperature_c: min_temp },
                    AlertSeverity::Critical,
                    format!("CRITICAL COLD WAVE! Temperature below freezing: {:.1}°C.", min_temp),
                    COLD_CRITICAL_ACTIONS,
                );
                return Some(alert.valid(anchor, None));
            }
            if min_temp < t.cold_c {
                let alert = Alert::new(
                    AlertKind::ColdWave { temperature_c: min_temp },
                    AlertSeverity::High,
                    format!("HIGH COLD WAVE ALERT! Very cold: {:.1}°C.", min_temp),
                    COLD_HIGH_ACTIONS,
                );
                return Some(alert.valid(anchor, None));
            }
        }

        let forecast = forecast?;
        let min_temp = forecast.iter().map(|d| d.min_temp_c).fold(f64::MAX, f64::min);
        if min_temp < t.freezing_c {
            let alert = Alert::new(
                AlertKind::ColdWaveForecast { temperature_c: min_temp },
                AlertSeverity::High,
                format!("Freezing temperatures expected! Down to {:.1}°C.", min_temp),
                COLD_FORECAST_ACTIONS,
            );
            return Some(alert.valid(anchor + Duration::days(1), None));
        }
        None
    }

    fn check_storm(
        &self,
        recent: &[WeatherRecord],
        forecast: Option<&[ForecastDay]>,
        anchor: NaiveDate,
    ) -> Option<Alert> {
        let t = &self.thresholds;

        if let [.., previous, latest] = recent {
            let pressure_change = latest.pressure_hpa - previous.pressure_hpa;
            let wind = latest.wind_speed_ms;

            if pressure_change < t.storm_pressure_drop_hpa && wind > t.storm_wind_ms {
                return Some(Alert::new(
                    AlertKind::Storm { wind_speed_ms: wind, pressure_change_hpa: pressure_change },
                    AlertSeverity::Critical,
                    format!(
                        "CRITICAL STORM! Rapid pressure drop ({:.1} hPa) with high winds ({:.1} m/s).",
                        pressure_change, wind
                    ),
                    STORM_ACTIONS,
                ));
            }
            if wind > t.high_wind_ms {
                return Some(Alert::new(
                    AlertKind::HighWind { wind_speed_ms: wind },
                    AlertSeverity::Critical,
                    format!("CRITICAL HIGH WIND! Speed: {:.1} m/s.", wind),
                    HIGH_WIND_ACTIONS,
                ));
            }
        }

        let forecast = forecast?;
        let max_wind = forecast.iter().map(|d| d.max_wind_ms).fold(f64::MIN, f64::max);
        let total_rain: f64 = forecast.iter().map(|d| d.rain_mm).sum();

        if max_wind > t.high_wind_ms {
            let alert = Alert::new(
                AlertKind::StormForecast { wind_speed_ms: max_wind },
                AlertSeverity::High,
                format!("Strong winds expected: up to {:.1} m/s in the coming days.", max_wind),
                STORM_FORECAST_ACTIONS,
            );
            return Some(alert.valid(anchor, None));
        }
        if total_rain > t.forecast_heavy_rain_mm {
            return Some(Alert::new(
                AlertKind::HeavyRainForecast { rainfall_mm: total_rain },
                AlertSeverity::High,
                format!("Heavy rain expected: {:.1}mm in the coming days.", total_rain),
                HEAVY_RAIN_FORECAST_ACTIONS,
            ));
        }
        None
    }
}

/// Evaluates with default thresholds.
pub fn evaluate(recent: &[WeatherRecord], forecast: Option<&[WeatherRecord]>) -> Result<Vec<Alert>> {
    AlertEngine::default().evaluate(recent, forecast)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HazardError;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    /// Calm, mild readings for consecutive January days.
    fn window(temps: &[f64]) -> Vec<WeatherRecord> {
        temps
            .iter()
            .enumerate()
            .map(|(i, &t)| WeatherRecord::new("Jacobabad", day(i as u32 + 1), 0.0, t, 1010.0, 3.0, 30.0))
            .collect()
    }

    fn forecast(temps: &[f64], start: u32) -> Vec<WeatherRecord> {
        temps
            .iter()
            .enumerate()
            .map(|(i, &t)| WeatherRecord::new("Jacobabad", day(start + i as u32), 0.0, t, 1010.0, 3.0, 30.0))
            .collect()
    }

    // --- Heatwave -----------------------------------------------------------

    #[test]
    fn test_three_severe_days_is_critical_heatwave() {
        let recent = window(&[28.0, 30.0, 29.0, 30.0, 41.0, 42.0, 43.0]);
        let alerts = evaluate(&recent, None).unwrap();
        assert_eq!(alerts.len(), 1);

        let alert = &alerts[0];
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert!(alert.message.contains("3 days"), "got: {}", alert.message);
        assert_eq!(alert.kind, AlertKind::Heatwave { temperature_c: 43.0, hot_days: 3 });
        assert_eq!(alert.valid_from, Some(day(7)));
        assert_eq!(alert.valid_until, Some(day(10)));
        assert_eq!(alert.actions[0], "Avoid outdoor activities");
    }

    #[test]
    fn test_three_moderate_days_is_high_heatwave() {
        let recent = window(&[36.0, 37.0, 38.0, 41.0]);
        let alerts = evaluate(&recent, None).unwrap();
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert_eq!(alerts[0].kind, AlertKind::Heatwave { temperature_c: 41.0, hot_days: 4 });
    }

    #[test]
    fn test_only_last_seven_days_count_toward_heatwave() {
        let recent = window(&[41.0, 41.0, 41.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0]);
        assert!(evaluate(&recent, None).unwrap().is_empty());
    }

    #[test]
    fn test_current_heat_needs_three_records() {
        let recent = window(&[45.0, 45.0]);
        assert!(evaluate(&recent, None).unwrap().is_empty());
    }

    #[test]
    fn test_forecast_heatwave_severity_depends_on_max() {
        let recent = window(&[30.0, 30.0, 30.0]);

        let mild = forecast(&[36.0, 37.0, 38.0, 30.0], 4);
        let alerts = evaluate(&recent, Some(&mild)).unwrap();
        assert_eq!(alerts[0].severity, AlertSeverity::Moderate);
        assert_eq!(alerts[0].kind.label(), "HEATWAVE (FORECAST)");
        assert_eq!(alerts[0].valid_from, Some(day(4)));

        let severe = forecast(&[36.0, 37.0, 41.0], 4);
        let alerts = evaluate(&recent, Some(&severe)).unwrap();
        assert_eq!(alerts[0].severity, AlertSeverity::High);
    }

    #[test]
    fn test_current_heatwave_wins_over_forecast() {
        let recent = window(&[36.0, 36.0, 36.0]);
        let hot = forecast(&[42.0, 42.0, 42.0], 4);
        let alerts = evaluate(&recent, Some(&hot)).unwrap();
        assert_eq!(alerts.len(), 1);
        assert!(!alerts[0].kind.is_forecast());
    }

    // --- Cold wave ----------------------------------------------------------

    #[test]
    fn test_freezing_minimum_is_critical_cold_wave() {
        let recent = window(&[10.0, 12.0, -2.0, 3.0, 1.0]);
        let alerts = evaluate(&recent, None).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].kind, AlertKind::ColdWave { temperature_c: -2.0 });
    }

    #[test]
    fn test_cold_wave_looks_at_last_three_days_only() {
        let recent = window(&[-5.0, 6.0, 4.0, 7.0]);
        let alerts = evaluate(&recent, None).unwrap();
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert_eq!(alerts[0].kind, AlertKind::ColdWave { temperature_c: 4.0 });
    }

    #[test]
    fn test_forecast_freeze_is_high() {
        let recent = window(&[8.0, 9.0, 10.0]);
        let cold = forecast(&[2.0, -1.5], 4);
        let alerts = evaluate(&recent, Some(&cold)).unwrap();
        assert_eq!(alerts[0].kind, AlertKind::ColdWaveForecast { temperature_c: -1.5 });
        assert_eq!(alerts[0].severity, AlertSeverity::High);
    }

    // --- Storm --------------------------------------------------------------

    #[test]
    fn test_pressure_drop_with_wind_is_storm_not_high_wind() {
        let mut recent = window(&[20.0, 20.0]);
        recent[1].pressure_hpa = 1004.0;
        recent[1].wind_speed_ms = 18.0;

        let alerts = evaluate(&recent, None).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(
            alerts[0].kind,
            AlertKind::Storm { wind_speed_ms: 18.0, pressure_change_hpa: -6.0 }
        );
    }

    #[test]
    fn test_high_wind_without_pressure_drop() {
        let mut recent = window(&[20.0, 20.0]);
        recent[1].wind_speed_ms = 22.0;
        let alerts = evaluate(&recent, None).unwrap();
        assert_eq!(alerts[0].kind, AlertKind::HighWind { wind_speed_ms: 22.0 });
    }

    #[test]
    fn test_forecast_wind_beats_forecast_rain() {
        let recent = window(&[20.0, 20.0]);
        let mut stormy = forecast(&[20.0, 20.0], 3);
        stormy[0].wind_speed_ms = 25.0;
        stormy[1].rainfall_mm = 150.0;
        let alerts = evaluate(&recent, Some(&stormy)).unwrap();
        assert_eq!(alerts[0].kind, AlertKind::StormForecast { wind_speed_ms: 25.0 });

        stormy[0].wind_speed_ms = 10.0;
        let alerts = evaluate(&recent, Some(&stormy)).unwrap();
        assert_eq!(alerts[0].kind, AlertKind::HeavyRainForecast { rainfall_mm: 150.0 });
        assert_eq!(alerts[0].severity, AlertSeverity::High);
    }

    // --- Ordering and edge cases --------------------------------------------

    #[test]
    fn test_critical_storm_sorted_before_high_forecast_heatwave() {
        let mut recent = window(&[30.0, 30.0, 30.0]);
        recent[2].pressure_hpa = 1003.0;
        recent[2].wind_speed_ms = 17.0;
        let hot = forecast(&[38.0, 39.0, 42.0], 4);

        let alerts = evaluate(&recent, Some(&hot)).unwrap();
        let labels: Vec<&str> = alerts.iter().map(|a| a.kind.label()).collect();
        assert_eq!(labels, vec!["STORM", "HEATWAVE (FORECAST)"]);
        assert_eq!(alerts[1].severity, AlertSeverity::High);
    }

    #[test]
    fn test_equal_severity_keeps_check_order() {
        let mut recent = window(&[41.0, 41.0, -1.0]);
        recent[2].wind_speed_ms = 21.0;
        let alerts = evaluate(&recent, None).unwrap();
        let labels: Vec<&str> = alerts.iter().map(|a| a.kind.label()).collect();
        assert_eq!(labels, vec!["COLD WAVE", "HIGH WIND"]);

        let mut recent = window(&[42.0, 43.0, 44.0]);
        recent[2].wind_speed_ms = 21.0;
        let alerts = evaluate(&recent, None).unwrap();
        let labels: Vec<&str> = alerts.iter().map(|a| a.kind.label()).collect();
        assert_eq!(labels, vec!["HEATWAVE", "HIGH WIND"]);
    }

    #[test]
    fn test_empty_inputs_produce_no_alerts() {
        assert!(evaluate(&[], None).unwrap().is_empty());
        assert!(evaluate(&[], Some(&[])).unwrap().is_empty());
    }

    #[test]
    fn test_forecast_only_anchors_day_before_first_forecast() {
        let cold = forecast(&[-3.0], 10);
        let alerts = evaluate(&[], Some(&cold)).unwrap();
        assert_eq!(alerts[0].valid_from, Some(day(10)));
    }

    #[test]
    fn test_three_hourly_forecast_counts_days_not_entries() {
        let recent = window(&[30.0, 30.0, 30.0]);
        let hourly: Vec<WeatherRecord> = [28.0, 27.0, 31.0, 36.0, 37.0, 36.5, 32.0, 29.0]
            .iter()
            .map(|&t| WeatherRecord::new("Jacobabad", day(4), 0.0, t, 1010.0, 3.0, 30.0))
            .collect();
        assert!(evaluate(&recent, Some(&hourly)).unwrap().is_empty());

        let mut three_days = hourly.clone();
        for d in [5, 6] {
            three_days.extend(hourly.iter().map(|e| WeatherRecord { date: day(d), ..e.clone() }));
        }
        let alerts = evaluate(&recent, Some(&three_days)).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::HeatwaveForecast { temperature_c: 37.0, hot_days: 3 });
        assert_eq!(alerts[0].valid_until, Some(day(6)));
    }

    #[test]
    fn test_sub_daily_forecast_folds_cold_wind_and_rain_per_day() {
        let recent = window(&[20.0, 20.0, 20.0]);
        let mut entries = forecast(&[4.0, -2.5, 6.0], 4);
        for e in entries.iter_mut() {
            e.date = day(4);
            e.rainfall_mm = 40.0;
        }
        entries[1].wind_speed_ms = 12.0;

        let alerts = evaluate(&recent, Some(&entries)).unwrap();
        let kinds: Vec<&AlertKind> = alerts.iter().map(|a| &a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &AlertKind::ColdWaveForecast { temperature_c: -2.5 },
                &AlertKind::HeavyRainForecast { rainfall_mm: 120.0 },
            ]
        );
    }

    #[test]
    fn test_missing_wind_is_rejected_not_defaulted() {
        // a missing wind reading must not pass as calm air
        let mut recent = window(&[20.0, 20.0]);
        recent[1].wind_speed_ms = f64::NAN;
        assert!(matches!(
            evaluate(&recent, None),
            Err(HazardError::NonFiniteReading { field: "wind_speed_ms", .. })
        ));
    }

    #[test]
    fn test_custom_thresholds() {
        let engine = AlertEngine::new(AlertThresholds { high_wind_ms: 10.0, ..AlertThresholds::default() });
        let mut recent = window(&[20.0, 20.0]);
        recent[1].wind_speed_ms = 12.0;
        let alerts = engine.evaluate(&recent, None).unwrap();
        assert_eq!(alerts[0].kind, AlertKind::HighWind { wind_speed_ms: 12.0 });
    }

    #[test]
    fn test_alert_serializes_with_type_tag_and_uppercase_severity() {
        let recent = window(&[-1.0, -1.0, -1.0]);
        let alerts = evaluate(&recent, None).unwrap();
        let json = serde_json::to_value(&alerts[0]).unwrap();
        assert_eq!(json["alert_type"], "cold_wave");
        assert_eq!(json["severity"], "CRITICAL");
        assert_eq!(json["temperature_c"], -1.0);
    }
}
