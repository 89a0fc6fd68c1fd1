//! Asynchronous enrichment of archived records

pub mod queue;

pub use queue::*;

use crate::geo::{GeoResolver, IntensityEstimator};
use std::sync::Arc;

/// Live collaborators a record needs to derive its display attributes.
///
/// Not persisted: every construction path, including reload from storage,
/// binds one before the record resolves a region or schedules enrichment.
#[derive(Clone)]
pub struct EnrichmentContext {
    pub queue: EnrichmentHandle,
    pub geo: Arc<dyn GeoResolver>,
    pub intensity: Arc<dyn IntensityEstimator>,
}

impl EnrichmentContext {
    pub fn new(
        queue: EnrichmentHandle,
        geo: Arc<dyn GeoResolver>,
        intensity: Arc<dyn IntensityEstimator>,
    ) -> Self {
        Self {
            queue,
            geo,
            intensity,
        }
    }
}

impl std::fmt::Debug for EnrichmentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentContext")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}
