//! Detection summaries handed over by the upstream locator

use crate::core::ids::RecordId;
use crate::core::quality::QualityClass;
use crate::core::temporal::Timestamp;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One station detection that contributed to a hypocenter solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSnapshot {
    /// Station latitude in degrees
    pub latitude: f64,
    /// Station longitude in degrees
    pub longitude: f64,
    /// Association ratio reported for this detection
    pub ratio: f64,
    /// P-wave arrival time
    pub arrival_time: Timestamp,
    /// Whether the detection was still considered valid when the event was finalized
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_valid() -> bool {
    true
}

impl DetectionSnapshot {
    /// Create a valid detection snapshot
    pub fn new(latitude: f64, longitude: f64, ratio: f64, arrival_time: Timestamp) -> Self {
        Self {
            latitude,
            longitude,
            ratio,
            arrival_time,
            valid: true,
        }
    }

    /// Mark the detection as invalid
    pub fn invalid(mut self) -> Self {
        self.valid = false;
        self
    }
}

/// Archived copy of a contributing detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArchivedDetection {
    pub latitude: f64,
    pub longitude: f64,
    pub ratio: f64,
    pub arrival_time: Timestamp,
}

impl From<&DetectionSnapshot> for ArchivedDetection {
    fn from(snapshot: &DetectionSnapshot) -> Self {
        Self {
            latitude: snapshot.latitude,
            longitude: snapshot.longitude,
            ratio: snapshot.ratio,
            arrival_time: snapshot.arrival_time,
        }
    }
}

/// A finalized event solution, as produced by the detection layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSummary {
    /// Event identifier
    #[serde(default)]
    pub id: RecordId,
    /// Hypocenter latitude in degrees
    pub latitude: f64,
    /// Hypocenter longitude in degrees
    pub longitude: f64,
    /// Hypocenter depth in km
    pub depth: f64,
    /// Estimated magnitude
    pub magnitude: f64,
    /// Origin time
    pub origin_time: Timestamp,
    /// Quality summary, absent when the solution carried none
    #[serde(default)]
    pub quality_class: Option<QualityClass>,
    /// Contributing detections, absent when the event has no cluster context
    #[serde(default)]
    pub detections: Option<Vec<DetectionSnapshot>>,
}

impl DetectionSummary {
    /// Create a summary without quality or detection context
    pub fn new(
        id: RecordId,
        latitude: f64,
        longitude: f64,
        depth: f64,
        magnitude: f64,
        origin_time: Timestamp,
    ) -> Self {
        Self {
            id,
            latitude,
            longitude,
            depth,
            magnitude,
            origin_time,
            quality_class: None,
            detections: None,
        }
    }

    /// Set the quality class
    pub fn with_quality(mut self, quality_class: QualityClass) -> Self {
        self.quality_class = Some(quality_class);
        self
    }

    /// Attach a contributing-detection snapshot
    pub fn with_detections(mut self, detections: Vec<DetectionSnapshot>) -> Self {
        self.detections = Some(detections);
        self
    }

    /// Reject summaries whose seismic parameters cannot describe a real event
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::InvalidSummary(format!(
                "latitude out of range: {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::InvalidSummary(format!(
                "longitude out of range: {}",
                self.longitude
            )));
        }
        if !self.depth.is_finite() {
            return Err(Error::InvalidSummary(format!("depth is not finite: {}", self.depth)));
        }
        if !self.magnitude.is_finite() {
            return Err(Error::InvalidSummary(format!(
                "magnitude is not finite: {}",
                self.magnitude
            )));
        }
        Ok(())
    }
}
