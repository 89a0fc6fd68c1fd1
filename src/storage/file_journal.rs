//! Single-file archive journal
//!
//! Layout: a fixed 32-byte header followed by the bincode-encoded snapshot
//! list. The header carries the record count, body length and a CRC32 of
//! the body. Saves go to a sibling temp file that is synced to disk and then
//! renamed over the journal, so a crash mid-write leaves the previous archive
//! intact.

use crate::core::snapshot::RecordSnapshot;
use crate::error::{Error, Result};
use crate::storage::journal::ArchiveJournal;
use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Journal file format version
pub const JOURNAL_VERSION: u8 = 1;

/// Journal header size (32 bytes)
pub const HEADER_SIZE: usize = 32;

/// Magic number: "QARCH"
pub const MAGIC: &[u8; 5] = b"QARCH";

/// Journal header structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalHeader {
    pub record_count: u32,
    pub body_len: u64,
    pub checksum: u32,
}

impl JournalHeader {
    /// Serialize header to bytes
    pub fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);

        buf.put_slice(MAGIC);
        buf.put_u8(JOURNAL_VERSION);
        // Reserved
        buf.put_u16(0);
        buf.put_u32(self.record_count);
        buf.put_u64(self.body_len);
        buf.put_u32(self.checksum);
        // Padding to 32 bytes: 5+1+2+4+8+4 = 24
        buf.put_bytes(0, 8);

        debug_assert_eq!(buf.len(), HEADER_SIZE);
        buf.freeze()
    }

    /// Deserialize header from bytes
    pub fn deserialize(mut buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::Storage("Journal shorter than header".to_string()));
        }

        let magic = &buf[0..5];
        if magic != MAGIC {
            return Err(Error::Storage(format!("Invalid magic number: {:?}", magic)));
        }
        buf.advance(5);

        let version = buf.get_u8();
        if version != JOURNAL_VERSION {
            return Err(Error::Storage(format!("Unsupported version: {}", version)));
        }
        buf.advance(2);

        let record_count = buf.get_u32();
        let body_len = buf.get_u64();
        let checksum = buf.get_u32();

        Ok(Self {
            record_count,
            body_len,
            checksum,
        })
    }
}

/// Encode snapshots into the journal file layout
pub fn encode_journal(records: &[RecordSnapshot]) -> Result<Vec<u8>> {
    let record_count = u32::try_from(records.len())
        .map_err(|_| Error::Storage(format!("Too many records: {}", records.len())))?;
    let body = bincode::serialize(records)?;

    let header = JournalHeader {
        record_count,
        body_len: body.len() as u64,
        checksum: crc32fast::hash(&body),
    };

    let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
    out.extend_from_slice(&header.serialize());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode and verify a journal file
pub fn decode_journal(bytes: &[u8]) -> Result<Vec<RecordSnapshot>> {
    let header = JournalHeader::deserialize(bytes)?;
    let body = &bytes[HEADER_SIZE..];

    if body.len() as u64 != header.body_len {
        return Err(Error::Storage(format!(
            "Journal body truncated: expected {} bytes, found {}",
            header.body_len,
            body.len()
        )));
    }
    if crc32fast::hash(body) != header.checksum {
        return Err(Error::Storage("Journal checksum mismatch".to_string()));
    }

    let records: Vec<RecordSnapshot> = bincode::deserialize(body)?;
    if records.len() != header.record_count as usize {
        return Err(Error::Storage(format!(
            "Journal record count mismatch: header says {}, body has {}",
            header.record_count,
            records.len()
        )));
    }
    Ok(records)
}

/// Archive journal backed by one file
#[derive(Debug, Clone)]
pub struct FileJournal {
    path: PathBuf,
}

impl FileJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ArchiveJournal for FileJournal {
    async fn save(&mut self, records: Vec<RecordSnapshot>) -> Result<()> {
        let bytes = encode_journal(&records)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp = self.temp_path();
        if let Err(e) = replace_with(&temp, &self.path, &bytes).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                debug!(path = %temp.display(), error = %cleanup, "Temp journal not removed");
            }
            return Err(e);
        }

        info!(
            path = %self.path.display(),
            records = records.len(),
            bytes = bytes.len(),
            "Archive journal saved"
        );
        Ok(())
    }

    async fn load(&self) -> Result<Vec<RecordSnapshot>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No archive journal yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let records = decode_journal(&bytes)?;
        info!(path = %self.path.display(), records = records.len(), "Archive journal loaded");
        Ok(records)
    }

    async fn flush(&mut self) -> Result<()> {
        // Saves sync the temp file before renaming it into place
        Ok(())
    }
}

async fn replace_with(temp: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = tokio::fs::File::create(temp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(temp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::detection::ArchivedDetection;
    use crate::core::ids::RecordId;
    use crate::core::quality::QualityClass;
    use crate::core::temporal::Timestamp;
    use tempfile::TempDir;

    fn snapshot(region: Option<&str>) -> RecordSnapshot {
        RecordSnapshot {
            id: RecordId::new(),
            latitude: -33.4,
            longitude: -70.6,
            depth: 35.0,
            origin_time: Timestamp::from_millis(1_700_000_000_000),
            magnitude: 5.9,
            quality_class: QualityClass::B,
            max_association_ratio: 2.0,
            detections: vec![ArchivedDetection {
                latitude: -33.0,
                longitude: -70.0,
                ratio: 2.0,
                arrival_time: Timestamp::from_millis(1_700_000_004_000),
            }],
            region: region.map(str::to_string),
            peak_intensity: 0.25,
            enriched: true,
            invalidated: false,
        }
    }

    #[test]
    fn test_header_layout() {
        let header = JournalHeader {
            record_count: 3,
            body_len: 1024,
            checksum: 0xDEAD_BEEF,
        };
        let bytes = header.serialize();

        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[0..5], MAGIC);
        assert_eq!(JournalHeader::deserialize(&bytes).unwrap(), header);
    }

    #[test]
    fn test_corruption_detected() {
        let mut bytes = encode_journal(&[snapshot(Some("Central Chile"))]).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;

        assert!(matches!(decode_journal(&bytes), Err(Error::Storage(_))));
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = encode_journal(&[]).unwrap();
        bytes[0] = b'X';

        assert!(matches!(decode_journal(&bytes), Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let mut journal = FileJournal::new(dir.path().join("archive").join("quakes.bin"));
        let records = vec![snapshot(Some("Central Chile")), snapshot(None)];

        journal.save(records.clone()).await.unwrap();
        journal.flush().await.unwrap();

        assert_eq!(journal.load().await.unwrap(), records);
        assert!(!journal.temp_path().exists());
    }

    #[tokio::test]
    async fn test_failed_save_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quakes.bin");
        // A non-empty directory in the way makes the final rename fail
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let mut journal = FileJournal::new(&path);
        assert!(journal.save(vec![snapshot(None)]).await.is_err());

        assert!(!journal.temp_path().exists());
        assert!(path.join("keep").exists());
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let journal = FileJournal::new(dir.path().join("absent.bin"));

        assert!(journal.load().await.unwrap().is_empty());
    }
}
