//! Display eligibility of archived records

use crate::core::quality::QualityClass;
use crate::core::record::ArchivedRecord;
use crate::core::temporal::{Timestamp, MILLIS_PER_HOUR};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// User-configurable display thresholds, stamped with the time they apply at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Worst quality class still shown (inclusive)
    pub quality_filter_threshold: QualityClass,
    pub magnitude_filter_enabled: bool,
    pub magnitude_filter_threshold: f64,
    pub time_filter_enabled: bool,
    pub time_filter_window_hours: f64,
    /// Reference time for the recency window
    #[serde(skip, default = "Timestamp::now")]
    pub now: Timestamp,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            quality_filter_threshold: QualityClass::WORST,
            magnitude_filter_enabled: false,
            magnitude_filter_threshold: 0.0,
            time_filter_enabled: false,
            time_filter_window_hours: 24.0,
            now: Timestamp::now(),
        }
    }
}

impl DisplayConfig {
    /// Same thresholds, evaluated at `now`
    pub fn at(mut self, now: Timestamp) -> Self {
        self.now = now;
        self
    }

    pub fn with_quality_threshold(mut self, threshold: QualityClass) -> Self {
        self.quality_filter_threshold = threshold;
        self
    }

    pub fn with_min_magnitude(mut self, threshold: f64) -> Self {
        self.magnitude_filter_enabled = true;
        self.magnitude_filter_threshold = threshold;
        self
    }

    pub fn with_time_window_hours(mut self, hours: f64) -> Self {
        self.time_filter_enabled = true;
        self.time_filter_window_hours = hours;
        self
    }

    /// Reject thresholds that would silently hide every record
    pub fn validate(&self) -> Result<()> {
        if !self.time_filter_window_hours.is_finite() || self.time_filter_window_hours < 0.0 {
            return Err(Error::Configuration(format!(
                "invalid time filter window: {}",
                self.time_filter_window_hours
            )));
        }
        if !self.magnitude_filter_threshold.is_finite() {
            return Err(Error::Configuration(format!(
                "invalid magnitude threshold: {}",
                self.magnitude_filter_threshold
            )));
        }
        Ok(())
    }
}

/// Stateless visibility policy: quality, then magnitude, then recency
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayFilter;

impl DisplayFilter {
    /// A record is shown only if it passes every enabled rule
    pub fn evaluate(&self, record: &ArchivedRecord, config: &DisplayConfig) -> bool {
        self.passes_quality(record, config)
            && self.passes_magnitude(record, config)
            && self.passes_recency(record, config)
    }

    fn passes_quality(&self, record: &ArchivedRecord, config: &DisplayConfig) -> bool {
        record.quality_class().rank() <= config.quality_filter_threshold.rank()
    }

    fn passes_magnitude(&self, record: &ArchivedRecord, config: &DisplayConfig) -> bool {
        !config.magnitude_filter_enabled || record.magnitude() >= config.magnitude_filter_threshold
    }

    fn passes_recency(&self, record: &ArchivedRecord, config: &DisplayConfig) -> bool {
        if !config.time_filter_enabled {
            return true;
        }
        let window_millis = config.time_filter_window_hours * MILLIS_PER_HOUR as f64;
        (config.now.millis_since(record.origin_time()) as f64) <= window_millis
    }
}
