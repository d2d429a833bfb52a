/// floodguard: flood and weather-hazard assessment for city-level daily weather.
///
/// # Module structure
///
/// ```text
/// floodguard
/// ├── model       — shared data types (WeatherRecord, EnrichedRecord, FloodLabel, …)
/// ├── error       — HazardError and the crate Result alias
/// ├── config      — floodguard.toml loader (alert thresholds, rebalance, limits)
/// ├── regions     — static city → geographic region registry
/// ├── logging     — tracing subscriber setup for the binary
/// ├── analysis
/// │   ├── groupings — partitions flat records into per-location series
/// │   ├── features  — rolling, trend, flag and interaction features
/// │   ├── labels    — rule-based flood labels, rebalancing, label statistics
/// │   └── summary   — current conditions and per-day forecast summary
/// ├── alert
/// │   ├── engine    — heatwave, cold wave and storm alerts
/// │   └── risk      — flood probability + alerts → risk assessment
/// ├── monitor     — bounded per-location history buffers
/// └── pipeline    — batch labeling and online assessment entry points
/// ```

/// Public modules
pub mod alert;
pub mod analysis;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod pipeline;
pub mod regions;

pub use error::{HazardError, Result};
