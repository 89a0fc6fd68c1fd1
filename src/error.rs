//! Error types for Quake-Archive

use crate::core::RecordId;
use thiserror::Error;

/// Result type alias for Quake-Archive operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Quake-Archive
#[derive(Error, Debug)]
pub enum Error {
    /// Detection summary rejected at construction
    #[error("Invalid detection summary: {0}")]
    InvalidSummary(String),

    /// A record with the same id is already archived
    #[error("Duplicate record: {0}")]
    DuplicateRecord(RecordId),

    /// No record with the given id
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// The enrichment queue no longer accepts jobs
    #[error("Enrichment queue is closed")]
    QueueClosed,

    /// Record has no enrichment context bound yet
    #[error("Record {0} is not bound to an enrichment context")]
    Unbound(RecordId),

    /// Region / distance lookup failed
    #[error("Geo error: {0}")]
    Geo(String),

    /// Ground-motion estimation failed
    #[error("Intensity error: {0}")]
    Intensity(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Configuration(e.to_string())
    }
}
