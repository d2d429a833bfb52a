/// Core data types for the hazard assessment pipeline.
///
/// This module defines the shared domain model imported by all other modules:
/// raw daily readings, the enriched feature record produced by the deriver,
/// and the offline flood label. Apart from input validation and feature
/// lookup by name it contains no logic and no I/O.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{HazardError, Result};
use crate::regions::Region;

// ---------------------------------------------------------------------------
// Thresholds shared by the deriver and the rule classifier
// ---------------------------------------------------------------------------

/// Daily rainfall at or below this (mm) counts as a dry day.
pub const WET_DAY_MIN_RAIN_MM: f64 = 0.1;

/// Daily rainfall above this (mm) marks a heavy rain day.
pub const HEAVY_RAIN_MM: f64 = 50.0;

/// Day-over-day pressure change below this (hPa) is a rapid drop.
pub const RAPID_PRESSURE_DROP_HPA: f64 = -3.0;

pub const EXTREME_HEAT_C: f64 = 40.0;
pub const EXTREME_COLD_C: f64 = 5.0;
pub const HIGH_HUMIDITY_PCT: f64 = 80.0;

// ---------------------------------------------------------------------------
// Raw readings
// ---------------------------------------------------------------------------

/// One day of observed (or forecast) weather for a location.
///
/// A sequence of these for one location, strictly ordered by date, is a
/// series. Gaps between dates are tolerated; nothing is interpolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub location: String,
    pub date: NaiveDate,
    pub rainfall_mm: f64,
    pub temperature_c: f64,
    pub pressure_hpa: f64,
    pub wind_speed_ms: f64,
    pub humidity_pct: f64,
}

impl WeatherRecord {
    pub fn new(
        location: &str,
        date: NaiveDate,
        rainfall_mm: f64,
        temperature_c: f64,
        pressure_hpa: f64,
        wind_speed_ms: f64,
        humidity_pct: f64,
    ) -> Self {
        WeatherRecord {
            location: location.to_string(),
            date,
            rainfall_mm,
            temperature_c,
            pressure_hpa,
            wind_speed_ms,
            humidity_pct,
        }
    }

    /// Rejects NaN and infinite readings so they never reach a threshold
    /// comparison. Missing provider values must be resolved upstream; they
    /// are not silently treated as 0.0 here.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("rainfall_mm", self.rainfall_mm),
            ("temperature_c", self.temperature_c),
            ("pressure_hpa", self.pressure_hpa),
            ("wind_speed_ms", self.wind_speed_ms),
            ("humidity_pct", self.humidity_pct),
        ];

        for (field, value) in fields {
            if !value.is_finite() {
                return Err(HazardError::NonFiniteReading {
                    location: self.location.clone(),
                    date: self.date,
                    field,
                });
            }
        }
        Ok(())
    }
}

/// Checks that `series` belongs to a single location, is strictly ordered
/// by date and holds only finite readings.
pub fn validate_series(series: &[WeatherRecord]) -> Result<()> {
    let Some(first) = series.first() else {
        return Ok(());
    };

    let mut previous: Option<NaiveDate> = None;
    for record in series {
        record.validate()?;

        if record.location != first.location {
            return Err(HazardError::MixedLocations {
                expected: first.location.clone(),
                found: record.location.clone(),
            });
        }

        if let Some(prev) = previous {
            if record.date == prev {
                return Err(HazardError::DuplicateDate {
                    location: record.location.clone(),
                    date: record.date,
                });
            }
            if record.date < prev {
                return Err(HazardError::UnorderedSeries {
                    location: record.location.clone(),
                    date: record.date,
                });
            }
        }
        previous = Some(record.date);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Climatological season by calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Spring,
    Monsoon,
    Autumn,
}

impl Season {
    /// Dec–Feb winter, Mar–May spring, Jun–Sep monsoon, Oct–Nov autumn.
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=9 => Season::Monsoon,
            _ => Season::Autumn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Monsoon => "monsoon",
            Season::Autumn => "autumn",
        }
    }
}

// ---------------------------------------------------------------------------
// Enriched records
// ---------------------------------------------------------------------------

/// A weather record plus every feature the deriver computes for it.
///
/// Rolling and trend fields for record *i* only look at records at index
/// ≤ *i* of the same location. `monthly_avg_pressure` is the exception: it
/// is a whole-series aggregate over the (location, month) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: WeatherRecord,

    // calendar
    pub month: u32,
    pub day_of_year: u32,
    pub week_of_year: u32,
    pub season: Season,
    pub is_monsoon_season: bool,
    pub is_winter_rain_season: bool,
    pub is_pre_monsoon: bool,
    pub is_post_monsoon: bool,

    pub region: Region,

    // rainfall
    pub rain_3day: f64,
    pub rain_7day: f64,
    pub rain_15day: f64,
    pub rain_30day: f64,
    pub rain_intensity: f64,
    pub heavy_rain_day: bool,
    pub consecutive_rain_days: u32,
    pub rain_7day_vs_30day: f64,

    // pressure
    pub pressure_change: f64,
    pub pressure_3day_trend: f64,
    pub rapid_pressure_drop: bool,
    pub monthly_avg_pressure: f64,
    pub pressure_anomaly: f64,

    // temperature
    pub temp_change: f64,
    pub temp_3day_trend: f64,
    pub extreme_heat: bool,
    pub extreme_cold: bool,

    // humidity
    pub humidity_change: f64,
    pub high_humidity: bool,

    // interactions
    pub monsoon_rain_7day: f64,
    pub coastal_storm_risk: bool,
    pub mountain_rain_risk: bool,
}

/// Every feature name `EnrichedRecord::feature` resolves, in dataset column
/// order. An external classifier's training feature list must be a subset.
pub const FEATURE_NAMES: &[&str] = &[
    "month",
    "day_of_year",
    "week_of_year",
    "rain",
    "rain_3day",
    "rain_7day",
    "rain_15day",
    "rain_30day",
    "rain_intensity",
    "consecutive_rain_days",
    "heavy_rain_day",
    "rain_7day_vs_30day",
    "pressure",
    "pressure_change",
    "pressure_3day_trend",
    "rapid_pressure_drop",
    "monthly_avg_pressure",
    "pressure_anomaly",
    "temp",
    "temp_change",
    "temp_3day_trend",
    "extreme_heat",
    "extreme_cold",
    "humidity",
    "humidity_change",
    "high_humidity",
    "wind_speed",
    "is_monsoon_season",
    "is_winter_rain_season",
    "is_pre_monsoon",
    "is_post_monsoon",
    "monsoon_rain_7day",
    "coastal_storm_risk",
    "mountain_rain_risk",
];

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

impl EnrichedRecord {
    pub fn location(&self) -> &str {
        &self.record.location
    }

    pub fn date(&self) -> NaiveDate {
        self.record.date
    }

    /// Looks a feature up by its dataset column name. Boolean flags read as
    /// 0.0 / 1.0.
    pub fn feature(&self, name: &str) -> Option<f64> {
        let value = match name {
            "month" => self.month as f64,
            "day_of_year" => self.day_of_year as f64,
            "week_of_year" => self.week_of_year as f64,
            "rain" => self.record.rainfall_mm,
            "rain_3day" => self.rain_3day,
            "rain_7day" => self.rain_7day,
            "rain_15day" => self.rain_15day,
            "rain_30day" => self.rain_30day,
            "rain_intensity" => self.rain_intensity,
            "consecutive_rain_days" => self.consecutive_rain_days as f64,
            "heavy_rain_day" => flag(self.heavy_rain_day),
            "rain_7day_vs_30day" => self.rain_7day_vs_30day,
            "pressure" => self.record.pressure_hpa,
            "pressure_change" => self.pressure_change,
            "pressure_3day_trend" => self.pressure_3day_trend,
            "rapid_pressure_drop" => flag(self.rapid_pressure_drop),
            "monthly_avg_pressure" => self.monthly_avg_pressure,
            "pressure_anomaly" => self.pressure_anomaly,
            "temp" => self.record.temperature_c,
            "temp_change" => self.temp_change,
            "temp_3day_trend" => self.temp_3day_trend,
            "extreme_heat" => flag(self.extreme_heat),
            "extreme_cold" => flag(self.extreme_cold),
            "humidity" => self.record.humidity_pct,
            "humidity_change" => self.humidity_change,
            "high_humidity" => flag(self.high_humidity),
            "wind_speed" => self.record.wind_speed_ms,
            "is_monsoon_season" => flag(self.is_monsoon_season),
            "is_winter_rain_season" => flag(self.is_winter_rain_season),
            "is_pre_monsoon" => flag(self.is_pre_monsoon),
            "is_post_monsoon" => flag(self.is_post_monsoon),
            "monsoon_rain_7day" => self.monsoon_rain_7day,
            "coastal_storm_risk" => flag(self.coastal_storm_risk),
            "mountain_rain_risk" => flag(self.mountain_rain_risk),
            _ => return None,
        };
        Some(value)
    }

    /// Builds the input row for an external classifier, in the order of
    /// `names`. Fails on the first name the deriver does not produce.
    pub fn feature_vector(&self, names: &[&str]) -> Result<Vec<f64>> {
        names
            .iter()
            .map(|name| {
                self.feature(name)
                    .ok_or_else(|| HazardError::UnknownFeature(name.to_string()))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Offline labels
// ---------------------------------------------------------------------------

/// Flood type tag. The `Synthetic*` variants are only ever assigned by
/// training-set rebalancing, never by the rule classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloodType {
    None,
    ExtremeRainfall,
    Monsoon,
    Urban,
    Riverine,
    Storm,
    Winter,
    CoastalCyclone,
    Glacial,
    FlashFlood,
    AridFlash,
    SyntheticCoastal,
    SyntheticGlacial,
    SyntheticFlash,
    Synthetic,
}

impl FloodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FloodType::None => "none",
            FloodType::ExtremeRainfall => "extreme_rainfall",
            FloodType::Monsoon => "monsoon",
            FloodType::Urban => "urban",
            FloodType::Riverine => "riverine",
            FloodType::Storm => "storm",
            FloodType::Winter => "winter",
            FloodType::CoastalCyclone => "coastal_cyclone",
            FloodType::Glacial => "glacial",
            FloodType::FlashFlood => "flash_flood",
            FloodType::AridFlash => "arid_flash",
            FloodType::SyntheticCoastal => "synthetic_coastal",
            FloodType::SyntheticGlacial => "synthetic_glacial",
            FloodType::SyntheticFlash => "synthetic_flash",
            FloodType::Synthetic => "synthetic",
        }
    }
}

/// Offline flood label for one enriched record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloodLabel {
    pub is_flood: bool,
    /// 1–5 when `is_flood`, otherwise 0.
    pub severity: u8,
    pub flood_type: FloodType,
}

impl FloodLabel {
    pub fn none() -> Self {
        FloodLabel {
            is_flood: false,
            severity: 0,
            flood_type: FloodType::None,
        }
    }
}

/// An enriched record paired with its label; one row of a training set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    #[serde(flatten)]
    pub features: EnrichedRecord,
    #[serde(flatten)]
    pub label: FloodLabel,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
