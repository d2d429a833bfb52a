/// In-memory per-location weather history for the online path.
///
/// ## Layout
///
/// - `LocationHistory` is a bounded ring buffer of daily records for one
///   location (default capacity 30). The oldest record is dropped once the
///   buffer is full.
/// - `HistoryBook` maps location names to their own
///   `Arc<Mutex<LocationHistory>>`, so writers for different locations never
///   contend on the same lock.
///
/// The book is owned by the caller; nothing here is global. Records pass the
/// same validation as the deriver before they are stored.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::error::{HazardError, Result};
use crate::model::WeatherRecord;

pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

// ---------------------------------------------------------------------------
// Single-location ring buffer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LocationHistory {
    location: String,
    capacity: usize,
    records: VecDeque<WeatherRecord>,
}

impl LocationHistory {
    pub fn new(location: &str, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(HazardError::InvalidConfig(
                "history capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            location: location.to_string(),
            capacity,
            records: VecDeque::with_capacity(capacity),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends a record, evicting the oldest one when full.
    ///
    /// A record dated the same as the newest stored record replaces it (a
    /// corrected reading). Older dates, other locations and non-finite
    /// readings are rejected and leave the buffer untouched.
    pub fn push(&mut self, record: WeatherRecord) -> Result<()> {
        record.validate()?;

        if record.location != self.location {
            return Err(HazardError::MixedLocations {
                expected: self.location.clone(),
                found: record.location,
            });
        }

        if let Some(newest) = self.records.back_mut() {
            if record.date == newest.date {
                debug!(location = %self.location, date = %record.date, "replacing same-day reading");
                *newest = record;
                return Ok(());
            }
            if record.date < newest.date {
                return Err(HazardError::UnorderedSeries {
                    location: record.location,
                    date: record.date,
                });
            }
        }

        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
        Ok(())
    }

    pub fn latest(&self) -> Option<&WeatherRecord> {
        self.records.back()
    }

    /// The buffered series, oldest first.
    pub fn series(&self) -> Vec<WeatherRecord> {
        self.records.iter().cloned().collect()
    }

    /// The last `n` buffered records, oldest first.
    pub fn recent(&self, n: usize) -> Vec<WeatherRecord> {
        let skip = self.records.len().saturating_sub(n);
        self.records.iter().skip(skip).cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Multi-location book
// ---------------------------------------------------------------------------

/// Per-location histories keyed by location name.
#[derive(Debug)]
pub struct HistoryBook {
    capacity: usize,
    locations: Mutex<HashMap<String, Arc<Mutex<LocationHistory>>>>,
}

impl Default for HistoryBook {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
            locations: Mutex::new(HashMap::new()),
        }
    }
}

impl HistoryBook {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(HazardError::InvalidConfig(
                "history capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            capacity,
            locations: Mutex::new(HashMap::new()),
        })
    }

    /// Handle to a location's history, created empty on first use.
    ///
    /// The outer map lock is only held while looking the handle up.
    pub fn history(&self, location: &str) -> Result<Arc<Mutex<LocationHistory>>> {
        let mut map = self.locations.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = map.get(location) {
            return Ok(Arc::clone(handle));
        }
        let handle = Arc::new(Mutex::new(LocationHistory::new(location, self.capacity)?));
        map.insert(location.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    pub fn record(&self, record: WeatherRecord) -> Result<()> {
        let handle = self.history(&record.location)?;
        let mut history = handle.lock().unwrap_or_else(|poisoned| {
            warn!(location = %record.location, "history lock poisoned; continuing with inner state");
            poisoned.into_inner()
        });
        history.push(record)
    }

    /// Snapshot of a location's last `n` records; empty if never seen.
    pub fn recent(&self, location: &str, n: usize) -> Vec<WeatherRecord> {
        let handle = {
            let map = self.locations.lock().unwrap_or_else(PoisonError::into_inner);
            map.get(location).cloned()
        };
        match handle {
            Some(handle) => handle.lock().unwrap_or_else(PoisonError::into_inner).recent(n),
            None => Vec::new(),
        }
    }

    /// Tracked locations, sorted.
    pub fn locations(&self) -> Vec<String> {
        let map = self.locations.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = map.keys().cloned().collect();
        names.sort();
        names
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
