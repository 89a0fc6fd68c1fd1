//! The archive collection

use crate::core::detection::DetectionSummary;
use crate::core::ids::RecordId;
use crate::core::quality::QualityClass;
use crate::core::record::ArchivedRecord;
use crate::core::temporal::Timestamp;
use crate::enrichment::EnrichmentContext;
use crate::error::{Error, Result};
use crate::query::{sort_for_display, DisplayConfig};
use crate::storage::{ArchiveJournal, InMemoryJournal};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Archive of finalized events.
///
/// Records can be added while other threads iterate; each record's derived
/// fields are updated independently by the enrichment worker.
pub struct Archive {
    /// Archived records by id
    records: DashMap<RecordId, Arc<ArchivedRecord>>,
    /// Collaborators bound into every record
    context: EnrichmentContext,
    /// Persistence backend
    journal: Arc<RwLock<dyn ArchiveJournal>>,
}

impl Archive {
    /// Create an archive persisting through `journal`
    pub fn new(context: EnrichmentContext, journal: Arc<RwLock<dyn ArchiveJournal>>) -> Self {
        Self {
            records: DashMap::new(),
            context,
            journal,
        }
    }

    /// Create an archive with an in-memory journal
    pub fn in_memory(context: EnrichmentContext) -> Self {
        Self::new(context, Arc::new(RwLock::new(InMemoryJournal::new())))
    }

    /// Archive a finalized detection summary.
    ///
    /// The record is returned right away; its intensity is filled in later by
    /// the enrichment worker.
    pub fn archive(&self, summary: &DetectionSummary) -> Result<Arc<ArchivedRecord>> {
        match self.records.entry(summary.id) {
            Entry::Occupied(_) => Err(Error::DuplicateRecord(summary.id)),
            Entry::Vacant(slot) => {
                let record = ArchivedRecord::from_summary(summary, self.context.clone())?;
                slot.insert(Arc::clone(&record));
                info!(
                    record_id = %record.id(),
                    magnitude = record.magnitude(),
                    quality = %record.quality_class(),
                    detections = record.assigned_stations(),
                    "Event archived"
                );
                Ok(record)
            }
        }
    }

    /// Archive a record rebuilt from bare parameters, without detection context
    #[allow(clippy::too_many_arguments)]
    pub fn archive_reconstructed(
        &self,
        id: RecordId,
        latitude: f64,
        longitude: f64,
        depth: f64,
        magnitude: f64,
        origin_time: Timestamp,
        quality_class: QualityClass,
    ) -> Result<Arc<ArchivedRecord>> {
        match self.records.entry(id) {
            Entry::Occupied(_) => Err(Error::DuplicateRecord(id)),
            Entry::Vacant(slot) => {
                let record = ArchivedRecord::new(
                    id,
                    latitude,
                    longitude,
                    depth,
                    magnitude,
                    origin_time,
                    quality_class,
                    self.context.clone(),
                );
                slot.insert(Arc::clone(&record));
                debug!(record_id = %id, "Reconstructed event archived");
                Ok(record)
            }
        }
    }

    /// Get a record by id
    pub fn get(&self, id: &RecordId) -> Option<Arc<ArchivedRecord>> {
        self.records.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a record, e.g. when a retention policy expires it
    pub fn remove(&self, id: &RecordId) -> Result<Arc<ArchivedRecord>> {
        self.records
            .remove(id)
            .map(|(_, record)| record)
            .ok_or(Error::NotFound(*id))
    }

    /// Flag a record as erroneous
    pub fn invalidate(&self, id: &RecordId) -> Result<()> {
        let record = self.get(id).ok_or(Error::NotFound(*id))?;
        record.invalidate();
        info!(record_id = %id, "Record marked invalid");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, in display order
    pub fn records(&self) -> Vec<Arc<ArchivedRecord>> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        sort_for_display(&mut records);
        records
    }

    /// Valid records passing the display filter, in display order
    pub fn list_for_display(&self, config: &DisplayConfig) -> Vec<Arc<ArchivedRecord>> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|entry| !entry.is_invalidated() && entry.is_display_eligible(config))
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        sort_for_display(&mut records);
        records
    }

    /// Resolve the region of every record that has none yet.
    ///
    /// Returns how many were resolved; failures are logged and skipped.
    pub fn resolve_missing_regions(&self) -> usize {
        self.records()
            .iter()
            .filter(|record| record.region().is_none())
            .filter(|record| record.resolve_region().is_ok())
            .count()
    }

    /// Persist every record through the journal
    pub async fn persist(&self) -> Result<()> {
        let snapshots: Vec<_> = self.records().iter().map(|r| r.snapshot()).collect();
        let count = snapshots.len();

        let mut journal = self.journal.write().await;
        journal.save(snapshots).await?;
        journal.flush().await?;

        debug!(records = count, "Archive persisted");
        Ok(())
    }

    /// Load persisted records, rebinding each to this archive's collaborators.
    ///
    /// Records already present are kept as they are. Returns the number of
    /// records added.
    pub async fn reload(&self) -> Result<usize> {
        let snapshots = self.journal.read().await.load().await?;

        let mut added = 0;
        for snapshot in snapshots {
            match self.records.entry(snapshot.id) {
                Entry::Occupied(_) => {
                    warn!(record_id = %snapshot.id, "Skipping persisted record already in archive");
                }
                Entry::Vacant(slot) => {
                    slot.insert(ArchivedRecord::restore(snapshot, self.context.clone()));
                    added += 1;
                }
            }
        }

        info!(records = added, "Archive reloaded");
        Ok(added)
    }
}
