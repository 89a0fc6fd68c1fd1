//! Filtering and ordering of archived records for display

pub mod filter;
pub mod ordering;

pub use filter::*;
pub use ordering::*;
