/// Service configuration loader - parses floodguard.toml
///
/// Keeps alert thresholds, rebalancing and resource limits out of the code so
/// a deployment can tune them without recompiling. Every section is optional;
/// anything left out falls back to the built-in defaults.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::alert::engine::AlertThresholds;
use crate::analysis::labels::RebalanceOptions;
use crate::error::{HazardError, Result};
use crate::monitor::DEFAULT_HISTORY_CAPACITY;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "floodguard.toml";

/// `[rebalance]` section: synthetic flood injection for training data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RebalanceConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub options: RebalanceOptions,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            options: RebalanceOptions::default(),
        }
    }
}

/// `[history]` section: per-location ring buffer size.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_HISTORY_CAPACITY }
    }
}

/// `[pipeline]` section: batch labeling worker pool.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub worker_threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { worker_threads: 4 }
    }
}

/// Root configuration structure for TOML parsing
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    pub alerts: AlertThresholds,
    pub rebalance: RebalanceConfig,
    pub history: HistoryConfig,
    pub pipeline: PipelineConfig,
}

impl HazardConfig {
    /// Rejects values that would make the pipeline misbehave rather than fail.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.rebalance.options.target_ratio) {
            return Err(HazardError::InvalidConfig(format!(
                "rebalance.target_ratio must be within [0, 1], got {}",
                self.rebalance.options.target_ratio
            )));
        }
        if self.history.capacity == 0 {
            return Err(HazardError::InvalidConfig("history.capacity must be at least 1".into()));
        }
        if self.pipeline.worker_threads == 0 {
            return Err(HazardError::InvalidConfig("pipeline.worker_threads must be at least 1".into()));
        }
        let a = &self.alerts;
        if a.heat_window_days == 0 || a.cold_window_days == 0 {
            return Err(HazardError::InvalidConfig("alert windows must be at least 1 day".into()));
        }
        if a.moderate_heat_c > a.severe_heat_c {
            return Err(HazardError::InvalidConfig(format!(
                "alerts.moderate_heat_c ({}) exceeds alerts.severe_heat_c ({})",
                a.moderate_heat_c, a.severe_heat_c
            )));
        }
        if a.freezing_c > a.cold_c {
            return Err(HazardError::InvalidConfig(format!(
                "alerts.freezing_c ({}) exceeds alerts.cold_c ({})",
                a.freezing_c, a.cold_c
            )));
        }
        Ok(())
    }
}

/// Parses and validates a configuration document.
pub fn parse_config(contents: &str) -> Result<HazardConfig> {
    let config: HazardConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from `path`.
///
/// A missing or malformed file is an error; use `load_config_default` for the
/// "file is optional" behaviour.
pub fn load_config(path: impl AsRef<Path>) -> Result<HazardConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_config(&contents)
}

/// Loads `floodguard.toml` from the working directory, falling back to the
/// built-in defaults when the file does not exist.
pub fn load_config_default() -> Result<HazardConfig> {
    let path = Path::new(DEFAULT_CONFIG_PATH);
    if !path.exists() {
        tracing::info!(path = DEFAULT_CONFIG_PATH, "no config file; using defaults");
        return Ok(HazardConfig::default());
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, HazardConfig::default());
        assert_eq!(config.history.capacity, 30);
        assert_eq!(config.pipeline.worker_threads, 4);
        assert!(config.rebalance.enabled);
        assert_eq!(config.rebalance.options.target_ratio, 0.05);
        assert_eq!(config.rebalance.options.seed, 42);
        assert_eq!(config.alerts.storm_wind_ms, 15.0);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = parse_config(
            r#"
            [alerts]
            high_wind_ms = 25.0

            [rebalance]
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.alerts.high_wind_ms, 25.0);
        assert_eq!(config.alerts.severe_heat_c, 40.0);
        assert_eq!(config.rebalance.options.seed, 7);
        assert_eq!(config.rebalance.options.target_ratio, 0.05);
        assert!(config.rebalance.enabled);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for doc in [
            "[rebalance]\ntarget_ratio = 1.5",
            "[history]\ncapacity = 0",
            "[pipeline]\nworker_threads = 0",
            "[alerts]\nmoderate_heat_c = 45.0",
            "[alerts]\nfreezing_c = 10.0",
        ] {
            assert!(
                matches!(parse_config(doc), Err(HazardError::InvalidConfig(_))),
                "accepted: {doc}"
            );
        }
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(matches!(parse_config("[alerts"), Err(HazardError::ConfigParse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            load_config("does/not/exist/floodguard.toml"),
            Err(HazardError::Io(_))
        ));
    }

    #[test]
    fn test_shipped_config_file_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/floodguard.toml");
        let config = load_config(path).unwrap();
        assert_eq!(config.history.capacity, 30);
    }
}
