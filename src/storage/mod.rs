//! Storage layer for the archive journal

pub mod file_journal;
pub mod journal;

pub use file_journal::*;
pub use journal::*;
