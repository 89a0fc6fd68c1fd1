//! CLI commands

use crate::core::{QualityClass, RecordId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quake-Archive CLI
#[derive(Parser)]
#[command(name = "quake-archive")]
#[command(about = "Seismic event archive with asynchronous enrichment")]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Journal file, overriding the configured one
    #[arg(short, long, global = true)]
    pub journal: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Archive detection summaries from a JSON-lines file
    Ingest {
        /// Input file, one detection summary per line
        input: PathBuf,
    },
    /// List archived events in display order
    List {
        /// Worst quality class to show
        #[arg(short, long)]
        quality: Option<QualityClass>,
        /// Minimum magnitude
        #[arg(short, long)]
        min_magnitude: Option<f64>,
        /// Only events from the last N hours
        #[arg(short, long)]
        within_hours: Option<f64>,
        /// Show every record, ignoring filters and invalidation
        #[arg(short, long)]
        all: bool,
        /// Print JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Show one archived event
    Show {
        /// Record ID
        id: RecordId,
    },
    /// Mark an archived event as erroneous
    Invalidate {
        /// Record ID
        id: RecordId,
    },
    /// Compute missing regions and intensities for reloaded events
    Enrich,
}
