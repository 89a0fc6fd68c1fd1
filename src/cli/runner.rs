//! Execution of CLI commands against a journal-backed archive

use crate::archive::Archive;
use crate::cli::commands::{Cli, Commands};
use crate::config::AppConfig;
use crate::core::{ArchivedRecord, DetectionSummary, Timestamp};
use crate::enrichment::{EnrichmentContext, EnrichmentQueue};
use crate::error::{Error, Result};
use crate::geo::NearestRegionResolver;
use crate::storage::FileJournal;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Outcome of ingesting a batch of summaries
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub archived: usize,
    pub skipped: usize,
}

/// Run one CLI invocation: reload, execute, persist if anything changed, shut down
pub async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let queue = EnrichmentQueue::start();
    let context = EnrichmentContext::new(
        queue.handle(),
        Arc::new(NearestRegionResolver::new(config.regions.clone())),
        Arc::new(config.intensity),
    );

    let journal_path = cli
        .journal
        .clone()
        .unwrap_or_else(|| config.archive.journal_path.clone());
    let archive = Archive::new(
        context,
        Arc::new(RwLock::new(FileJournal::new(journal_path))),
    );

    let outcome = async {
        archive.reload().await?;
        if execute(&cli.command, &archive, &config).await? {
            queue.drain().await?;
            archive.persist().await?;
        }
        Ok::<(), Error>(())
    }
    .await;

    // Shut the worker down on every path, including failed reload or persist
    queue.shutdown().await;
    outcome
}

/// Execute a command; returns whether the archive changed
async fn execute(command: &Commands, archive: &Archive, config: &AppConfig) -> Result<bool> {
    match command {
        Commands::Ingest { input } => {
            let report = ingest_file(archive, input).await?;
            println!(
                "Archived {} events ({} skipped)",
                report.archived, report.skipped
            );
            Ok(report.archived > 0)
        }
        Commands::List {
            quality,
            min_magnitude,
            within_hours,
            all,
            json,
        } => {
            let records = if *all {
                archive.records()
            } else {
                let mut display = config.display;
                if let Some(quality) = quality {
                    display = display.with_quality_threshold(*quality);
                }
                if let Some(magnitude) = min_magnitude {
                    display = display.with_min_magnitude(*magnitude);
                }
                if let Some(hours) = within_hours {
                    display = display.with_time_window_hours(*hours);
                }
                display.validate()?;
                archive.list_for_display(&display.at(Timestamp::now()))
            };

            for record in &records {
                if *json {
                    println!("{}", serde_json::to_string(&**record)?);
                } else {
                    println!("{}", list_line(record));
                }
            }
            Ok(false)
        }
        Commands::Show { id } => {
            let record = archive.get(id).ok_or(Error::NotFound(*id))?;
            println!("{}", serde_json::to_string_pretty(&*record)?);
            Ok(false)
        }
        Commands::Invalidate { id } => {
            archive.invalidate(id)?;
            println!("Invalidated {}", id);
            Ok(true)
        }
        Commands::Enrich => {
            let mut requested = 0;
            for record in archive.records() {
                if !record.is_enriched() {
                    record.request_enrichment()?;
                    requested += 1;
                }
            }
            let regions = archive.resolve_missing_regions();
            println!(
                "Requested enrichment for {} events, resolved {} regions",
                requested, regions
            );
            Ok(requested > 0 || regions > 0)
        }
    }
}

/// Archive every summary in a JSON-lines file.
///
/// Malformed lines and rejected summaries are logged and skipped; the rest
/// of the file is still archived.
pub async fn ingest_file(archive: &Archive, input: &Path) -> Result<IngestReport> {
    let contents = tokio::fs::read_to_string(input).await?;
    Ok(ingest_lines(archive, &contents))
}

/// Archive every summary in a JSON-lines string
pub fn ingest_lines(archive: &Archive, contents: &str) -> IngestReport {
    let mut report = IngestReport::default();

    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let archived = serde_json::from_str::<DetectionSummary>(line)
            .map_err(Error::from)
            .and_then(|summary| archive.archive(&summary));

        match archived {
            Ok(record) => {
                if let Err(e) = record.resolve_region() {
                    warn!(record_id = %record.id(), error = %e, "Region left unresolved");
                }
                report.archived += 1;
            }
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping detection summary");
                report.skipped += 1;
            }
        }
    }

    info!(archived = report.archived, skipped = report.skipped, "Ingest finished");
    report
}

fn list_line(record: &ArchivedRecord) -> String {
    format!(
        "{}  {}  PGA {:.4}{}",
        record.id(),
        record,
        record.peak_intensity(),
        if record.is_invalidated() { "  (invalid)" } else { "" }
    )
}
