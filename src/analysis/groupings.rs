/// Location grouping and series ordering.
///
/// `group_by_location` takes a flat list of `WeatherRecord`s (as produced by
/// an ingest layer, possibly interleaving many cities and arbitrary dates)
/// and organizes it into one date-ordered series per location. Every rolling
/// window downstream assumes this shape, so it is the first step of both the
/// offline labeling pipeline and `features::derive`.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::model::{validate_series, WeatherRecord};

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Groups records into a map keyed by location, each value sorted by date.
///
/// The map is ordered by location name so iteration never depends on hash
/// order. Each resulting series is validated: a non-finite reading or two
/// records for the same location and date is an error, since silently
/// keeping either duplicate would shift every rolling window after it.
pub fn group_by_location(records: Vec<WeatherRecord>) -> Result<BTreeMap<String, Vec<WeatherRecord>>> {
    let mut grouped: BTreeMap<String, Vec<WeatherRecord>> = BTreeMap::new();

    for record in records {
        grouped.entry(record.location.clone()).or_default().push(record);
    }

    for series in grouped.values_mut() {
        series.sort_by_key(|r| r.date);
        validate_series(series)?;
    }

    Ok(grouped)
}

/// Keeps the last `n` records of a date-ordered series.
pub fn tail(series: &[WeatherRecord], n: usize) -> &[WeatherRecord] {
    &series[series.len().saturating_sub(n)..]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HazardError;
    use chrono::{Datelike, NaiveDate};

    fn reading(location: &str, day: u32, rain: f64) -> WeatherRecord {
        let date = NaiveDate::from_ymd_opt(2023, 8, day).unwrap();
        WeatherRecord::new(location, date, rain, 30.0, 1000.0, 3.0, 60.0)
    }

    #[test]
    fn test_group_by_location_produces_one_entry_per_location() {
        let records = vec![
            reading("Karachi", 1, 0.0),
            reading("Lahore", 1, 0.0),
            reading("Karachi", 2, 0.0),
        ];
        let grouped = group_by_location(records).expect("valid input");
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["Karachi"].len(), 2);
        assert_eq!(grouped["Lahore"].len(), 1);
    }

    #[test]
    fn test_group_by_location_sorts_each_series_by_date() {
        let records = vec![
            reading("Lahore", 3, 3.0),
            reading("Lahore", 1, 1.0),
            reading("Lahore", 2, 2.0),
        ];
        let grouped = group_by_location(records).expect("valid input");
        let rains: Vec<f64> = grouped["Lahore"].iter().map(|r| r.rainfall_mm).collect();
        assert_eq!(rains, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_group_by_location_iterates_in_name_order() {
        let records = vec![
            reading("Sukkur", 1, 0.0),
            reading("Gilgit", 1, 0.0),
            reading("Multan", 1, 0.0),
        ];
        let grouped = group_by_location(records).expect("valid input");
        let names: Vec<&str> = grouped.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["Gilgit", "Multan", "Sukkur"]);
    }

    #[test]
    fn test_group_by_location_rejects_duplicate_days() {
        let records = vec![reading("Lahore", 1, 0.0), reading("Lahore", 1, 5.0)];
        let result = group_by_location(records);
        assert!(matches!(result, Err(HazardError::DuplicateDate { .. })));
    }

    #[test]
    fn test_group_by_location_empty_input_returns_empty_map() {
        let grouped = group_by_location(vec![]).expect("empty input is valid");
        assert!(grouped.is_empty());
    }

    #[test]
    fn test_tail_handles_short_series() {
        let series = vec![reading("Lahore", 1, 0.0), reading("Lahore", 2, 0.0)];
        assert_eq!(tail(&series, 7).len(), 2);
        assert_eq!(tail(&series, 1)[0].date.day0(), 1);
        assert!(tail(&[], 3).is_empty());
    }
}
