/// Batch and online entry points built on the analysis and alert modules.
///
/// This module wires the pure operations together:
/// 1. `label_dataset`: offline, partition a flat dataset per location, derive
///    features and label each location on a worker pool, rebalance, and
///    summarize the labels.
/// 2. `assess`: online, derive features for a recent window, evaluate hazard
///    alerts, aggregate flood risk and build the weekly summary.
/// 3. `assess_location`: `assess` over a location's buffered history.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::mpsc;

use serde::{Deserialize, Serialize};
use threadpool::ThreadPool;
use tracing::{debug, info, warn};

use crate::alert::engine::{Alert, AlertEngine};
use crate::alert::risk::{aggregate, ClassifierOutcome, ContributingFactors, RiskAssessment};
use crate::analysis::features::derive_series;
use crate::analysis::groupings::group_by_location;
use crate::analysis::labels::{classify_series, rebalance, LabelStats, RegionalSynthesis};
use crate::analysis::summary::{weekly_summary, WeatherSummary};
use crate::config::HazardConfig;
use crate::error::{HazardError, Result};
use crate::model::{LabeledRecord, WeatherRecord};
use crate::monitor::HistoryBook;

// ---------------------------------------------------------------------------
// Batch labeling
// ---------------------------------------------------------------------------

/// Labeled training set plus its summary statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledDataset {
    pub records: Vec<LabeledRecord>,
    /// Records flipped to synthetic floods by rebalancing.
    pub synthetic: usize,
    pub stats: LabelStats,
}

type WorkerResult = (usize, Result<Vec<LabeledRecord>>);

/// Derives and labels every location in `records`.
///
/// Locations are processed in parallel on `config.pipeline.worker_threads`
/// workers; output is ordered by location name, then date, regardless of
/// which worker finishes first. The first failing location (in name order)
/// fails the whole batch.
pub fn label_dataset(records: Vec<WeatherRecord>, config: &HazardConfig) -> Result<LabeledDataset> {
    config.validate()?;

    let groups = group_by_location(records)?;
    let names: Vec<String> = groups.keys().cloned().collect();
    info!(locations = names.len(), "labeling dataset");

    let workers = config.pipeline.worker_threads.min(names.len()).max(1);
    let pool = ThreadPool::new(workers);
    let (tx, rx) = mpsc::channel::<WorkerResult>();

    for (index, (location, series)) in groups.into_iter().enumerate() {
        let tx = tx.clone();
        pool.execute(move || {
            let labeled = derive_series(&series).map(|enriched| classify_series(&enriched));
            if let Ok(ref rows) = labeled {
                let floods = rows.iter().filter(|r| r.label.is_flood).count();
                debug!(location = %location, records = rows.len(), floods, "labeled location");
            }
            // receiver outlives the pool; a send error only means the batch was abandoned
            let _ = tx.send((index, labeled));
        });
    }
    drop(tx);

    // a panicking worker drops its sender without reporting
    let mut finished: BTreeMap<usize, Result<Vec<LabeledRecord>>> = rx.iter().collect();
    pool.join();

    let mut labeled = Vec::new();
    for (index, location) in names.iter().enumerate() {
        match finished.remove(&index) {
            Some(Ok(rows)) => labeled.extend(rows),
            Some(Err(e)) => return Err(e),
            None => return Err(HazardError::WorkerFailed(location.clone())),
        }
    }

    let synthetic = if config.rebalance.enabled {
        rebalance(&mut labeled, &config.rebalance.options, &RegionalSynthesis)?
    } else {
        0
    };

    let stats = LabelStats::from_records(&labeled);
    info!(
        total = stats.total,
        floods = stats.floods,
        flood_ratio = stats.flood_ratio,
        synthetic,
        "labeled dataset ready"
    );

    Ok(LabeledDataset { records: labeled, synthetic, stats })
}

// ---------------------------------------------------------------------------
// Online assessment
// ---------------------------------------------------------------------------

/// Flood risk section of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RiskStatus {
    Assessed(RiskAssessment),
    /// No classifier probability was available; alerts are still reported.
    Unavailable { reason: String },
}

impl RiskStatus {
    pub fn assessment(&self) -> Option<&RiskAssessment> {
        match self {
            RiskStatus::Assessed(risk) => Some(risk),
            RiskStatus::Unavailable { .. } => None,
        }
    }
}

/// Everything the online path knows about one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardReport {
    pub location: Option<String>,
    pub alerts: Vec<Alert>,
    pub risk: RiskStatus,
    pub summary: WeatherSummary,
}

/// Assesses a single location from its recent window and optional forecast.
///
/// `recent` must be one location's date-ordered series. An unavailable
/// classifier yields `RiskStatus::Unavailable` instead of an error; every
/// other failure (bad input, out-of-range probability) is returned.
pub fn assess(
    recent: &[WeatherRecord],
    forecast: Option<&[WeatherRecord]>,
    outcome: ClassifierOutcome,
    config: &HazardConfig,
) -> Result<HazardReport> {
    config.validate()?;

    let enriched = derive_series(recent)?;
    let alerts = AlertEngine::new(config.alerts.clone()).evaluate(recent, forecast)?;

    let location = recent
        .first()
        .or_else(|| forecast.and_then(|f| f.first()))
        .map(|r| r.location.clone());

    let risk = match aggregate(outcome, &alerts) {
        Ok(risk) => match enriched.last() {
            Some(latest) => RiskStatus::Assessed(risk.with_factors(ContributingFactors::from_enriched(latest))),
            None => RiskStatus::Assessed(risk),
        },
        Err(HazardError::ClassifierUnavailable(reason)) => {
            warn!(location = ?location, %reason, "flood classifier unavailable; reporting alerts only");
            RiskStatus::Unavailable { reason }
        }
        Err(e) => return Err(e),
    };

    info!(location = ?location, alerts = alerts.len(), "assessment complete");

    Ok(HazardReport {
        location,
        alerts,
        risk,
        summary: weekly_summary(recent, forecast),
    })
}

/// Assesses `location` from the records buffered in `book`.
pub fn assess_location(
    book: &HistoryBook,
    location: &str,
    forecast: Option<&[WeatherRecord]>,
    outcome: ClassifierOutcome,
    config: &HazardConfig,
) -> Result<HazardReport> {
    let recent = book.recent(location, config.history.capacity);
    let mut report = assess(&recent, forecast, outcome, config)?;
    if report.location.is_none() {
        report.location = Some(location.to_string());
    }
    Ok(report)
}

/// Splits a flat input file into its single location and date-sorted series.
///
/// Returns `None` for empty input and `MixedLocations` when records for more
/// than one location are present.
pub fn single_location(records: Vec<WeatherRecord>) -> Result<Option<(String, Vec<WeatherRecord>)>> {
    let mut groups = group_by_location(records)?.into_iter();
    let Some((location, series)) = groups.next() else {
        return Ok(None);
    };
    if let Some((other, _)) = groups.next() {
        return Err(HazardError::MixedLocations { expected: location, found: other });
    }
    Ok(Some((location, series)))
}

// ---------------------------------------------------------------------------
// JSON I/O
// ---------------------------------------------------------------------------

/// Reads a JSON array of weather records.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<WeatherRecord>> {
    let file = File::open(path.as_ref())?;
    let records: Vec<WeatherRecord> = serde_json::from_reader(BufReader::new(file))?;
    Ok(records)
}

/// Writes any serializable value as pretty JSON.
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::risk::RiskCategory;
    use chrono::{Duration, NaiveDate};

    fn series(location: &str, days: usize, rain: f64) -> Vec<WeatherRecord> {
        let start = NaiveDate::from_ymd_opt(2022, 8, 1).unwrap();
        (0..days)
            .map(|i| {
                WeatherRecord::new(location, start + Duration::days(i as i64), rain, 30.0, 1005.0, 5.0, 70.0)
            })
            .collect()
    }

    fn no_rebalance() -> HazardConfig {
        let mut config = HazardConfig::default();
        config.rebalance.enabled = false;
        config
    }

    #[test]
    fn test_label_dataset_orders_by_location_then_date() {
        let mut records = series("Sukkur", 5, 0.0);
        records.extend(series("Karachi", 5, 0.0));
        records.reverse();

        let dataset = label_dataset(records, &no_rebalance()).unwrap();
        assert_eq!(dataset.records.len(), 10);
        assert_eq!(dataset.records[0].features.location(), "Karachi");
        assert_eq!(dataset.records[9].features.location(), "Sukkur");
        assert!(dataset.records[..5].windows(2).all(|w| w[0].features.date() < w[1].features.date()));
        assert_eq!(dataset.synthetic, 0);
        assert_eq!(dataset.stats.total, 10);
    }

    #[test]
    fn test_label_dataset_same_result_for_any_worker_count() {
        let mut records = Vec::new();
        for city in ["Lahore", "Multan", "Gilgit", "Quetta", "Karachi"] {
            records.extend(series(city, 20, 12.0));
        }
        let mut one = HazardConfig::default();
        one.pipeline.worker_threads = 1;
        let mut eight = HazardConfig::default();
        eight.pipeline.worker_threads = 8;

        let a = label_dataset(records.clone(), &one).unwrap();
        let b = label_dataset(records, &eight).unwrap();
        assert_eq!(a.records, b.records);
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn test_label_dataset_rebalances_when_enabled() {
        let records = series("Hyderabad", 100, 0.0);
        let dataset = label_dataset(records, &HazardConfig::default()).unwrap();
        assert_eq!(dataset.synthetic, 5);
        assert_eq!(dataset.stats.floods, 5);
    }

    #[test]
    fn test_label_dataset_propagates_bad_reading() {
        let mut records = series("Lahore", 3, 0.0);
        records[1].humidity_pct = f64::INFINITY;
        assert!(matches!(
            label_dataset(records, &no_rebalance()),
            Err(HazardError::NonFiniteReading { .. })
        ));
    }

    #[test]
    fn test_assess_with_probability_attaches_factors() {
        let recent = series("Karachi", 7, 40.0);
        let report = assess(&recent, None, ClassifierOutcome::Probability(0.7), &HazardConfig::default()).unwrap();

        assert_eq!(report.location.as_deref(), Some("Karachi"));
        let risk = report.risk.assessment().unwrap();
        assert_eq!(risk.category, RiskCategory::High);
        let factors = risk.factors.as_ref().unwrap();
        assert_eq!(factors.rainfall_3day, 120.0);
        assert_eq!(factors.soil_saturation, 100);
        assert!(report.summary.current.is_some());
    }

    #[test]
    fn test_assess_without_classifier_still_reports_alerts() {
        let mut recent = series("Karachi", 3, 0.0);
        recent[2].wind_speed_ms = 24.0;
        let report = assess(
            &recent,
            None,
            ClassifierOutcome::Unavailable("model not loaded".into()),
            &HazardConfig::default(),
        )
        .unwrap();

        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.risk, RiskStatus::Unavailable { reason: "model not loaded".into() });
    }

    #[test]
    fn test_assess_rejects_invalid_probability() {
        let recent = series("Karachi", 3, 0.0);
        assert!(matches!(
            assess(&recent, None, ClassifierOutcome::Probability(1.2), &HazardConfig::default()),
            Err(HazardError::InvalidProbability(_))
        ));
    }

    #[test]
    fn test_assess_location_uses_buffered_history() {
        let book = HistoryBook::new(30).unwrap();
        for record in series("Peshawar", 40, 2.0) {
            book.record(record).unwrap();
        }
        let report = assess_location(
            &book,
            "Peshawar",
            None,
            ClassifierOutcome::Probability(0.1),
            &HazardConfig::default(),
        )
        .unwrap();
        let current = report.summary.current.unwrap();
        assert_eq!(current.date, NaiveDate::from_ymd_opt(2022, 9, 9).unwrap());

        let empty = assess_location(&book, "Gilgit", None, ClassifierOutcome::Probability(0.1), &HazardConfig::default())
            .unwrap();
        assert_eq!(empty.location.as_deref(), Some("Gilgit"));
        assert!(empty.alerts.is_empty());
    }

    #[test]
    fn test_assess_rejects_invalid_config() {
        let mut config = HazardConfig::default();
        config.alerts.heat_window_days = 0;
        assert!(matches!(
            assess(&series("Lahore", 5, 0.0), None, ClassifierOutcome::Probability(0.2), &config),
            Err(HazardError::InvalidConfig(_))
        ));

        let book = HistoryBook::new(config.history.capacity).unwrap();
        assert!(matches!(
            assess_location(&book, "Lahore", None, ClassifierOutcome::Probability(0.2), &config),
            Err(HazardError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_single_location_sorts_unordered_input() {
        let mut records = series("Multan", 5, 0.0);
        records.reverse();

        let (location, sorted) = single_location(records).unwrap().unwrap();
        assert_eq!(location, "Multan");
        assert!(sorted.windows(2).all(|w| w[0].date < w[1].date));
        assert!(assess(&sorted, None, ClassifierOutcome::Probability(0.2), &HazardConfig::default()).is_ok());
    }

    #[test]
    fn test_single_location_rejects_mixed_input() {
        let mut records = series("Multan", 3, 0.0);
        records.extend(series("Lahore", 3, 0.0));

        match single_location(records) {
            Err(HazardError::MixedLocations { expected, found }) => {
                assert_eq!(expected, "Lahore");
                assert_eq!(found, "Multan");
            }
            other => panic!("expected MixedLocations, got {:?}", other),
        }
        assert!(single_location(Vec::new()).unwrap().is_none());
    }

    #[test]
    fn test_report_serializes_risk_status_tag() {
        let report = assess(&[], None, ClassifierOutcome::Unavailable("offline".into()), &HazardConfig::default())
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["risk"]["status"], "unavailable");
        assert_eq!(json["risk"]["reason"], "offline");
    }
}
