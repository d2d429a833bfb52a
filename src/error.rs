/// Error types for the hazard assessment pipeline.
use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for floodguard operations
#[derive(Error, Debug)]
pub enum HazardError {
    /// A reading carried NaN or an infinite value
    #[error("Non-finite {field} for {location} on {date}")]
    NonFiniteReading {
        location: String,
        date: NaiveDate,
        field: &'static str,
    },

    /// Two records for the same location share a date
    #[error("Duplicate record for {location} on {date}")]
    DuplicateDate { location: String, date: NaiveDate },

    /// A single-location series was not strictly ordered by date
    #[error("Series for {location} is out of order at {date}")]
    UnorderedSeries { location: String, date: NaiveDate },

    /// A single-location operation received records for another location
    #[error("Expected records for {expected}, found {found}")]
    MixedLocations { expected: String, found: String },

    /// Requested feature is not produced by the deriver
    #[error("Unknown feature: {0}")]
    UnknownFeature(String),

    /// Probability outside [0, 1] or not a number
    #[error("Invalid classifier probability: {0}")]
    InvalidProbability(f64),

    /// The external flood classifier produced no probability
    #[error("Flood classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading a config or data file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML configuration could not be parsed
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// JSON input/output failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A worker thread exited without returning its result
    #[error("Worker failed for {0}")]
    WorkerFailed(String),
}

/// Type alias for Results using HazardError
pub type Result<T> = std::result::Result<T, HazardError>;
