/// Geographic region registry.
///
/// Maps a location name to the region whose flood thresholds apply to it.
/// This is the single source of truth for region membership; other modules
/// should call `region_of` rather than hardcoding city names.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

/// Geographic region used to select region-specific flood scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// Cyclones and storm surge.
    Coastal,
    /// Glacial melt and lake outbursts.
    Northern,
    /// Landslides and flash floods.
    Mountain,
    /// Riverine flooding on the Indus plains.
    Plain,
    /// Flash floods after drought.
    Arid,
    Other,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Coastal => "coastal",
            Region::Northern => "northern",
            Region::Mountain => "mountain",
            Region::Plain => "plain",
            Region::Arid => "arid",
            Region::Other => "other",
        }
    }
}

// ---------------------------------------------------------------------------
// Membership lists
// ---------------------------------------------------------------------------

pub static COASTAL_CITIES: &[&str] = &["Karachi", "Gwadar", "Thatta"];

pub static NORTHERN_CITIES: &[&str] = &["Gilgit", "Skardu", "Hunza", "Chilas", "Muzaffarabad"];

pub static MOUNTAIN_CITIES: &[&str] = &["Abbottabad", "Murree", "Swat", "Mansehra"];

pub static PLAIN_CITIES: &[&str] = &[
    "Lahore",
    "Faisalabad",
    "Multan",
    "Sialkot",
    "Gujranwala",
    "Rawalpindi",
];

pub static ARID_CITIES: &[&str] = &["Quetta", "Turbat", "Khuzdar", "Jacobabad", "Sukkur"];

/// Region membership, checked in order. A city listed in more than one
/// table (none currently are) takes the first match.
static REGION_REGISTRY: &[(Region, &[&str])] = &[
    (Region::Coastal, COASTAL_CITIES),
    (Region::Northern, NORTHERN_CITIES),
    (Region::Mountain, MOUNTAIN_CITIES),
    (Region::Plain, PLAIN_CITIES),
    (Region::Arid, ARID_CITIES),
];

/// Returns the region for a location name. Matching is exact and
/// case-sensitive; anything unlisted is `Region::Other`.
pub fn region_of(location: &str) -> Region {
    REGION_REGISTRY
        .iter()
        .find(|(_, cities)| cities.contains(&location))
        .map(|(region, _)| *region)
        .unwrap_or(Region::Other)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
