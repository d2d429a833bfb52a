/// Rule-based flood labeling for training-set construction.
///
/// # Scenarios
///
/// Eleven independently defined scenarios are evaluated against each
/// enriched record:
///
/// - **Region-specific**: coastal, northern, mountain, plain, arid
/// - **Generic**: extreme rainfall, monsoon, urban, riverine, storm, winter
///
/// A record is a flood if any scenario fires. Severity blends the 7-day
/// rainfall, the pressure change and the wet-day run length into 1–5.
///
/// # Tag precedence
///
/// The flood type is assigned by walking `TAG_RULES` in order and letting
/// every matching rule overwrite the tag written before it, so the
/// region-specific tags always win over the generic ones. This is not
/// first-match: reordering or short-circuiting the table changes labels.
/// The plain scenario has no tag of its own; a record flagged only by it is
/// a flood tagged `none`.
///
/// # Rebalancing
///
/// `rebalance` tops up an under-represented flood class with seeded
/// synthetic floods. It is an augmentation utility for training only and is
/// never applied on the real-time path.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{HazardError, Result};
use crate::model::{EnrichedRecord, FloodLabel, FloodType, LabeledRecord};
use crate::regions::Region;

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// One flood scenario. Discriminants index `ScenarioSet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Coastal,
    Northern,
    Mountain,
    Plain,
    Arid,
    ExtremeRainfall,
    Monsoon,
    Urban,
    Riverine,
    Storm,
    Winter,
}

impl Scenario {
    pub const ALL: [Scenario; 11] = [
        Scenario::Coastal,
        Scenario::Northern,
        Scenario::Mountain,
        Scenario::Plain,
        Scenario::Arid,
        Scenario::ExtremeRainfall,
        Scenario::Monsoon,
        Scenario::Urban,
        Scenario::Riverine,
        Scenario::Storm,
        Scenario::Winter,
    ];

    /// Whether this scenario's conditions hold for `r`.
    pub fn matches(&self, r: &EnrichedRecord) -> bool {
        let rain = r.record.rainfall_mm;
        let temp = r.record.temperature_c;

        match self {
            // cyclone indicator or heavy rain
            Scenario::Coastal => {
                r.region == Region::Coastal && (r.rapid_pressure_drop || r.rain_3day > 100.0)
            }
            // snowmelt plus rain
            Scenario::Northern => r.region == Region::Northern && temp > 25.0 && r.rain_7day > 50.0,
            Scenario::Mountain => {
                r.region == Region::Mountain && (r.rain_3day > 150.0 || r.consecutive_rain_days > 3)
            }
            Scenario::Plain => {
                r.region == Region::Plain
                    && (r.rain_15day > 200.0 || (r.is_monsoon_season && r.rain_7day > 100.0))
            }
            // first rain after a dry spell
            Scenario::Arid => r.region == Region::Arid && rain > 30.0 && r.consecutive_rain_days == 1,
            Scenario::ExtremeRainfall => rain > 100.0 || r.rain_3day > 200.0 || r.rain_7day > 300.0,
            Scenario::Monsoon => {
                r.is_monsoon_season
                    && (r.rain_3day > 80.0 || r.rain_7day > 150.0)
                    && r.pressure_change < -1.0
            }
            Scenario::Urban => rain > 50.0 && r.rain_3day > 70.0,
            Scenario::Riverine => r.rain_15day > 250.0 || r.rain_30day > 400.0,
            Scenario::Storm => r.pressure_change < -3.0 && rain > 40.0,
            Scenario::Winter => r.is_winter_rain_season && r.rain_3day > 60.0 && temp < 20.0,
        }
    }
}

/// Which scenarios fired for one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScenarioSet([bool; 11]);

impl ScenarioSet {
    pub fn evaluate(r: &EnrichedRecord) -> Self {
        let mut set = ScenarioSet::default();
        for scenario in Scenario::ALL {
            set.0[scenario as usize] = scenario.matches(r);
        }
        set
    }

    pub fn contains(&self, scenario: Scenario) -> bool {
        self.0[scenario as usize]
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|&fired| fired)
    }
}

// ---------------------------------------------------------------------------
// Tag precedence
// ---------------------------------------------------------------------------

/// A tag write: if `scenario` fired and none of `unless` did, the record's
/// tag becomes `tag`, replacing whatever an earlier rule wrote.
struct TagRule {
    scenario: Scenario,
    tag: FloodType,
    unless: &'static [Scenario],
}

/// Applied top to bottom; later writes win.
static TAG_RULES: &[TagRule] = &[
    TagRule { scenario: Scenario::ExtremeRainfall, tag: FloodType::ExtremeRainfall, unless: &[] },
    TagRule {
        scenario: Scenario::Monsoon,
        tag: FloodType::Monsoon,
        unless: &[Scenario::ExtremeRainfall],
    },
    TagRule {
        scenario: Scenario::Urban,
        tag: FloodType::Urban,
        unless: &[Scenario::ExtremeRainfall, Scenario::Monsoon],
    },
    TagRule {
        scenario: Scenario::Riverine,
        tag: FloodType::Riverine,
        unless: &[Scenario::ExtremeRainfall, Scenario::Monsoon, Scenario::Urban],
    },
    TagRule { scenario: Scenario::Storm, tag: FloodType::Storm, unless: &[] },
    TagRule { scenario: Scenario::Winter, tag: FloodType::Winter, unless: &[] },
    TagRule { scenario: Scenario::Coastal, tag: FloodType::CoastalCyclone, unless: &[] },
    TagRule { scenario: Scenario::Northern, tag: FloodType::Glacial, unless: &[] },
    TagRule { scenario: Scenario::Mountain, tag: FloodType::FlashFlood, unless: &[] },
    TagRule { scenario: Scenario::Arid, tag: FloodType::AridFlash, unless: &[] },
];

fn flood_type(set: &ScenarioSet) -> FloodType {
    TAG_RULES.iter().fold(FloodType::None, |tag, rule| {
        let blocked = rule.unless.iter().any(|s| set.contains(*s));
        if set.contains(rule.scenario) && !blocked { rule.tag } else { tag }
    })
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Blends rainfall, pressure change and wet-day duration into 1–5.
///
/// Rounds half to even so a score landing exactly on .5 matches the
/// labels in previously generated datasets.
pub fn severity(r: &EnrichedRecord) -> u8 {
    let rain_factor = (r.rain_7day / 300.0).clamp(0.0, 1.0);
    let pressure_factor = (r.pressure_change.abs() / 5.0).clamp(0.0, 1.0);
    let duration_factor = (r.consecutive_rain_days as f64 / 7.0).clamp(0.0, 1.0);

    let score = 0.4 * rain_factor + 0.3 * pressure_factor + 0.3 * duration_factor;
    (4.0 * score + 1.0).round_ties_even().clamp(1.0, 5.0) as u8
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Labels one enriched record.
pub fn classify(r: &EnrichedRecord) -> FloodLabel {
    let set = ScenarioSet::evaluate(r);
    if !set.any() {
        return FloodLabel::none();
    }

    FloodLabel {
        is_flood: true,
        severity: severity(r),
        flood_type: flood_type(&set),
    }
}

/// Labels every record of an enriched series.
pub fn classify_series(records: &[EnrichedRecord]) -> Vec<LabeledRecord> {
    records
        .iter()
        .map(|r| LabeledRecord {
            features: r.clone(),
            label: classify(r),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Rebalancing
// ---------------------------------------------------------------------------

/// Decides what a synthetic flood looks like for a chosen record.
///
/// Implementations mutate the record's features and label in place; the
/// caller has already set `is_flood`.
pub trait SyntheticFloodPolicy {
    fn synthesize(&self, record: &mut LabeledRecord, rng: &mut StdRng);
}

/// Default policy: region-appropriate magnitudes and `synthetic_*` tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionalSynthesis;

impl SyntheticFloodPolicy for RegionalSynthesis {
    fn synthesize(&self, record: &mut LabeledRecord, rng: &mut StdRng) {
        let f = &mut record.features;
        let tag = match f.region {
            Region::Coastal => {
                f.pressure_change = rng.gen_range(-5.0..-3.0);
                f.rain_3day = rng.gen_range(80.0..150.0);
                FloodType::SyntheticCoastal
            }
            Region::Northern => {
                f.record.temperature_c = rng.gen_range(20.0..30.0);
                f.rain_7day = rng.gen_range(60.0..120.0);
                FloodType::SyntheticGlacial
            }
            Region::Mountain => {
                f.rain_3day = rng.gen_range(120.0..200.0);
                f.consecutive_rain_days = rng.gen_range(3..6);
                FloodType::SyntheticFlash
            }
            _ => {
                f.rain_7day = rng.gen_range(150.0..250.0);
                f.rain_15day = rng.gen_range(200.0..350.0);
                FloodType::Synthetic
            }
        };
        record.label.flood_type = tag;
        record.label.severity = rng.gen_range(2..5);
    }
}

/// Target flood ratio and seed for `rebalance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceOptions {
    pub target_ratio: f64,
    pub seed: u64,
}

impl Default for RebalanceOptions {
    fn default() -> Self {
        Self {
            target_ratio: 0.05,
            seed: 42,
        }
    }
}

/// Flips non-flood records to synthetic floods until the flood ratio reaches
/// `options.target_ratio`. Returns how many records were flipped.
///
/// Record selection and magnitudes come from a generator seeded with
/// `options.seed`, so the same input and options always produce the same
/// output.
pub fn rebalance<P: SyntheticFloodPolicy>(
    records: &mut [LabeledRecord],
    options: &RebalanceOptions,
    policy: &P,
) -> Result<usize> {
    if !(0.0..=1.0).contains(&options.target_ratio) {
        return Err(HazardError::InvalidConfig(format!(
            "rebalance target_ratio must be within [0, 1], got {}",
            options.target_ratio
        )));
    }

    let total = records.len();
    if total == 0 {
        return Ok(0);
    }

    let current = records.iter().filter(|r| r.label.is_flood).count();
    let current_ratio = current as f64 / total as f64;
    if current_ratio >= options.target_ratio {
        debug!(current_ratio, target = options.target_ratio, "flood ratio already at target");
        return Ok(0);
    }

    let total_needed = (total as f64 * options.target_ratio) as usize;
    let needed = total_needed.saturating_sub(current);
    if needed == 0 {
        return Ok(0);
    }

    let candidates: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.label.is_flood)
        .map(|(i, _)| i)
        .collect();

    let mut rng = StdRng::seed_from_u64(options.seed);
    let amount = needed.min(candidates.len());
    let chosen = index::sample(&mut rng, candidates.len(), amount);

    for pick in chosen.iter() {
        let record = &mut records[candidates[pick]];
        record.label.is_flood = true;
        policy.synthesize(record, &mut rng);
    }

    info!(
        added = amount,
        before = current_ratio,
        after = (current + amount) as f64 / total as f64,
        "added synthetic flood events"
    );
    Ok(amount)
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Record and flood counts for one region or location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCounts {
    pub records: usize,
    pub floods: usize,
}

impl GroupCounts {
    /// Flood share of this group's records, in percent.
    pub fn flood_pct(&self) -> f64 {
        if self.records == 0 {
            0.0
        } else {
            self.floods as f64 / self.records as f64 * 100.0
        }
    }
}

/// Mean weather conditions over a set of labeled records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanConditions {
    pub rain_7day: f64,
    pub pressure_change: f64,
    pub humidity: f64,
    pub temperature: f64,
}

#[derive(Default)]
struct ConditionSums {
    count: usize,
    rain_7day: f64,
    pressure_change: f64,
    humidity: f64,
    temperature: f64,
}

impl ConditionSums {
    fn add(&mut self, r: &EnrichedRecord) {
        self.count += 1;
        self.rain_7day += r.rain_7day;
        self.pressure_change += r.pressure_change;
        self.humidity += r.record.humidity_pct;
        self.temperature += r.record.temperature_c;
    }

    fn mean(&self) -> Option<MeanConditions> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(MeanConditions {
            rain_7day: self.rain_7day / n,
            pressure_change: self.pressure_change / n,
            humidity: self.humidity / n,
            temperature: self.temperature / n,
        })
    }
}

/// Summary of a labeled dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelStats {
    pub total: usize,
    pub floods: usize,
    pub flood_ratio: f64,
    pub by_type: BTreeMap<FloodType, usize>,
    pub by_region: BTreeMap<Region, GroupCounts>,
    pub by_location: BTreeMap<String, GroupCounts>,
    /// Flood records per calendar month (1-12); months without floods are absent.
    pub floods_by_month: BTreeMap<u32, usize>,
    pub mean_severity: Option<f64>,
    /// Mean conditions on flood days; `None` without floods.
    pub flood_conditions: Option<MeanConditions>,
    /// Mean conditions on non-flood days; `None` if every record is a flood.
    pub normal_conditions: Option<MeanConditions>,
}

impl LabelStats {
    pub fn from_records(records: &[LabeledRecord]) -> Self {
        let mut stats = LabelStats {
            total: records.len(),
            ..LabelStats::default()
        };
        let mut severity_sum = 0u64;
        let mut flood_sums = ConditionSums::default();
        let mut normal_sums = ConditionSums::default();

        for r in records {
            let f = &r.features;
            let region = stats.by_region.entry(f.region).or_default();
            region.records += 1;
            let location = stats.by_location.entry(f.location().to_string()).or_default();
            location.records += 1;

            if r.label.is_flood {
                region.floods += 1;
                location.floods += 1;
                stats.floods += 1;
                severity_sum += r.label.severity as u64;
                *stats.by_type.entry(r.label.flood_type).or_insert(0) += 1;
                *stats.floods_by_month.entry(f.month).or_insert(0) += 1;
                flood_sums.add(f);
            } else {
                normal_sums.add(f);
            }
        }

        if stats.total > 0 {
            stats.flood_ratio = stats.floods as f64 / stats.total as f64;
        }
        if stats.floods > 0 {
            stats.mean_severity = Some(severity_sum as f64 / stats.floods as f64);
        }
        stats.flood_conditions = flood_sums.mean();
        stats.normal_conditions = normal_sums.mean();
        stats
    }

    /// Locations ordered by flood count (descending), ties by name.
    pub fn top_flood_locations(&self, n: usize) -> Vec<(&str, &GroupCounts)> {
        let mut ranked: Vec<(&str, &GroupCounts)> =
            self.by_location.iter().map(|(name, counts)| (name.as_str(), counts)).collect();
        ranked.sort_by(|a, b| b.1.floods.cmp(&a.1.floods));
        ranked.truncate(n);
        ranked
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
