//! Command-line interface

pub mod commands;
pub mod runner;

pub use commands::*;
pub use runner::*;
