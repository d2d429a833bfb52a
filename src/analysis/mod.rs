/// Offline analysis of per-location weather series.
///
/// Submodules:
/// - `groupings` — partitions flat input into date-ordered per-location series.
/// - `features`  — derives rolling, trend, flag and interaction features.
/// - `labels`    — rule-based flood labels, rebalancing and label statistics.
/// - `summary`   — current conditions and per-day forecast aggregation.

pub mod features;
pub mod groupings;
pub mod labels;
pub mod summary;
