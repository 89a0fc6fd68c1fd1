//! Core data types and models

pub mod detection;
pub mod ids;
pub mod quality;
pub mod record;
pub mod snapshot;
pub mod temporal;

pub use detection::*;
pub use ids::*;
pub use quality::*;
pub use record::*;
pub use snapshot::*;
pub use temporal::*;
