//! Quake-Archive: archive of finalized seismic events
//!
//! Records finalized detection events and enriches each one in the background
//! with derived display attributes, without blocking the code that archived it.
//!
//! # Core Concepts
//!
//! - **Archived records**: immutable seismic parameters plus derived fields
//!   (region name, peak ground acceleration) that are filled in later
//! - **Enrichment queue**: a single worker that runs every enrichment job in
//!   the process, one at a time
//! - **Display filter**: quality, magnitude and recency thresholds deciding
//!   which records a consumer shows
//! - **Display order**: newest first, ties broken by id
//!
//! # Example
//!
//! ```no_run
//! use quake_archive::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> quake_archive::error::Result<()> {
//! let queue = EnrichmentQueue::start();
//! let context = EnrichmentContext::new(
//!     queue.handle(),
//!     Arc::new(NearestRegionResolver::default()),
//!     Arc::new(AttenuationEstimator::default()),
//! );
//! let archive = Archive::in_memory(context);
//!
//! let summary = DetectionSummary::new(
//!     RecordId::new(), 35.0, 139.0, 10.0, 6.5, Timestamp::now(),
//! )
//! .with_quality(QualityClass::S);
//! let record = archive.archive(&summary)?;
//!
//! queue.drain().await?;
//! println!("{} PGA {}", record, record.peak_intensity());
//!
//! queue.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod core;
pub mod enrichment;
pub mod error;
pub mod geo;
pub mod monitor;
pub mod query;
pub mod storage;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::archive::Archive;
    pub use crate::core::*;
    pub use crate::enrichment::{EnrichmentContext, EnrichmentHandle, EnrichmentQueue};
    pub use crate::error::{Error, Result};
    pub use crate::geo::*;
    pub use crate::query::*;
    pub use crate::storage::*;
}
