//! Combines an external flood probability with the active hazard alerts.
//!
//! The flood classifier itself lives outside this crate; callers hand its
//! result in as a `ClassifierOutcome`. An unavailable classifier is an error,
//! never a silent "Low".

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alert::engine::Alert;
use crate::error::{HazardError, Result};
use crate::model::EnrichedRecord;

/// Most recommendations a single assessment carries.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Result of asking the external flood classifier for a probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierOutcome {
    Probability(f64),
    /// The model is not loaded or could not score the input.
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    Severe,
}

impl RiskCategory {
    /// Category for a 0-100 risk score.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=29 => RiskCategory::Low,
            30..=59 => RiskCategory::Moderate,
            60..=84 => RiskCategory::High,
            _ => RiskCategory::Severe,
        }
    }

    /// Display colour used by dashboards.
    pub fn color(&self) -> &'static str {
        match self {
            RiskCategory::Low => "green",
            RiskCategory::Moderate => "yellow",
            RiskCategory::High => "orange",
            RiskCategory::Severe => "red",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureTrend {
    Falling,
    Rising,
    Stable,
}

impl PressureTrend {
    pub fn from_change(change_hpa: f64) -> Self {
        if change_hpa < -1.0 {
            PressureTrend::Falling
        } else if change_hpa > 1.0 {
            PressureTrend::Rising
        } else {
            PressureTrend::Stable
        }
    }
}

/// Conditions behind an assessment, taken from the latest enriched record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributingFactors {
    pub rainfall_3day: f64,
    pub pressure_trend: PressureTrend,
    /// Rough soil saturation from 7-day rain, 0-100.
    pub soil_saturation: u8,
    pub current_rainfall: f64,
    pub temperature: f64,
    pub humidity: f64,
}

impl ContributingFactors {
    pub fn from_enriched(latest: &EnrichedRecord) -> Self {
        let saturation = (latest.rain_7day / 200.0 * 100.0).trunc().clamp(0.0, 100.0);
        ContributingFactors {
            rainfall_3day: (latest.rain_3day * 10.0).round() / 10.0,
            pressure_trend: PressureTrend::from_change(latest.pressure_change),
            soil_saturation: saturation as u8,
            current_rainfall: latest.record.rainfall_mm,
            temperature: latest.record.temperature_c,
            humidity: latest.record.humidity_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub probability: f64,
    /// `trunc(100 * probability)`.
    pub risk_score: u8,
    pub category: RiskCategory,
    pub predicted_flood: bool,
    /// Probability of the predicted class.
    pub confidence: f64,
    pub factors: Option<ContributingFactors>,
    pub recommendations: Vec<String>,
}

impl RiskAssessment {
    pub fn with_factors(mut self, factors: ContributingFactors) -> Self {
        self.factors = Some(factors);
        self
    }
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

const SEVERE_FLOOD_ACTIONS: &[&str] = &[
    "CRITICAL: SEVERE FLOOD RISK! Follow evacuation orders immediately!",
    "Move to higher ground right now",
    "Keep emergency phone charged and monitor alerts",
    "Avoid walking or driving through flood waters",
];

const HIGH_FLOOD_ACTIONS: &[&str] = &[
    "HIGH FLOOD RISK! Prepare for possible evacuation",
    "Move vehicles to higher ground",
    "Prepare emergency kit with documents",
    "Charge all communication devices",
];

const MODERATE_FLOOD_ACTIONS: &[&str] = &[
    "Moderate flood risk detected",
    "Prepare emergency kit and supplies",
    "Monitor local weather updates",
    "Clear drainage areas around your property",
];

const LOW_PREDICTED_ACTIONS: &[&str] = &["Flood risk detected. Stay alert and monitor conditions."];

const NO_FLOOD_ACTIONS: &[&str] = &[
    "No flood risk detected by ML model",
    "Continue monitoring weather conditions",
    "Review your emergency plan regularly",
];

fn recommendations(predicted: bool, category: RiskCategory, alerts: &[Alert]) -> Vec<String> {
    let tier = match (predicted, category) {
        (false, _) => NO_FLOOD_ACTIONS,
        (true, RiskCategory::Severe) => SEVERE_FLOOD_ACTIONS,
        (true, RiskCategory::High) => HIGH_FLOOD_ACTIONS,
        (true, RiskCategory::Moderate) => MODERATE_FLOOD_ACTIONS,
        (true, RiskCategory::Low) => LOW_PREDICTED_ACTIONS,
    };

    let alert_actions = alerts
        .iter()
        .filter(|a| a.severity.is_actionable())
        .flat_map(|a| a.actions.iter().take(2).map(String::as_str));

    let mut out: Vec<String> = Vec::with_capacity(MAX_RECOMMENDATIONS);
    for rec in tier.iter().copied().chain(alert_actions) {
        if out.len() == MAX_RECOMMENDATIONS {
            break;
        }
        if !out.iter().any(|seen| seen == rec) {
            out.push(rec.to_string());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Turns a classifier outcome and the current alerts into a `RiskAssessment`.
///
/// Factors are left empty; attach them with `RiskAssessment::with_factors`.
pub fn aggregate(outcome: ClassifierOutcome, alerts: &[Alert]) -> Result<RiskAssessment> {
    let probability = match outcome {
        ClassifierOutcome::Probability(p) => p,
        ClassifierOutcome::Unavailable(reason) => return Err(HazardError::ClassifierUnavailable(reason)),
    };
    if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
        return Err(HazardError::InvalidProbability(probability));
    }

    let risk_score = (probability * 100.0).trunc() as u8;
    let category = RiskCategory::from_score(risk_score);
    let predicted_flood = probability > 0.5;
    let confidence = if predicted_flood { probability } else { 1.0 - probability };

    debug!(probability, risk_score, ?category, alerts = alerts.len(), "aggregated flood risk");

    Ok(RiskAssessment {
        probability,
        risk_score,
        category,
        predicted_flood,
        confidence,
        factors: None,
        recommendations: recommendations(predicted_flood, category, alerts),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
