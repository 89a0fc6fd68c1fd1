//! Archive journal: persistence of record snapshots

use crate::core::snapshot::RecordSnapshot;
use crate::error::Result;
use async_trait::async_trait;

/// Trait for archive journal implementations
#[async_trait]
pub trait ArchiveJournal: Send + Sync {
    /// Replace the persisted archive with `records`
    async fn save(&mut self, records: Vec<RecordSnapshot>) -> Result<()>;

    /// Load every persisted record
    async fn load(&self) -> Result<Vec<RecordSnapshot>>;

    /// Flush pending writes to disk
    async fn flush(&mut self) -> Result<()>;
}

/// In-memory implementation of the archive journal
#[derive(Debug, Default)]
pub struct InMemoryJournal {
    records: Vec<RecordSnapshot>,
}

impl InMemoryJournal {
    /// Create an empty in-memory journal
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a journal pre-populated with snapshots
    pub fn with_records(records: Vec<RecordSnapshot>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl ArchiveJournal for InMemoryJournal {
    async fn save(&mut self, records: Vec<RecordSnapshot>) -> Result<()> {
        self.records = records;
        Ok(())
    }

    async fn load(&self) -> Result<Vec<RecordSnapshot>> {
        Ok(self.records.clone())
    }

    async fn flush(&mut self) -> Result<()> {
        // In-memory journal doesn't need flushing
        Ok(())
    }
}
