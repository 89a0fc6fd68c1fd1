//! Persisted form of an archived record

use crate::core::detection::ArchivedDetection;
use crate::core::ids::RecordId;
use crate::core::quality::QualityClass;
use crate::core::temporal::Timestamp;
use serde::{Deserialize, Serialize};

/// Everything about a record that survives a restart.
///
/// The enrichment context is deliberately absent; a record rebuilt from a
/// snapshot has to be bound again before it can resolve or enrich.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub id: RecordId,
    pub latitude: f64,
    pub longitude: f64,
    pub depth: f64,
    pub origin_time: Timestamp,
    pub magnitude: f64,
    pub quality_class: QualityClass,
    pub max_association_ratio: f64,
    pub detections: Vec<ArchivedDetection>,
    pub region: Option<String>,
    pub peak_intensity: f64,
    pub enriched: bool,
    pub invalidated: bool,
}
