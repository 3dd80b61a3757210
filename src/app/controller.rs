use std::path::Path;

use chrono::Utc;
use log::{info, warn};

use crate::error::Result;
use crate::fetch::{BatchDriver, ChannelFactory, FIXED_OFFSETS};
use crate::records::{truncate_faults, write_faults, BatchReport};
use crate::services::TradingViewFactory;
use crate::utils::{ensure_parent_dir, format_utc, load_identifiers};

use super::bootstrap::FetchJob;

/// Fetch every identifier in `job.input` from the live chart source and write the report files.
pub async fn run_fetch(job: FetchJob) -> Result<BatchReport> {
    let factory = TradingViewFactory::new(job.config.source.clone());
    run_fetch_with(factory, job).await
}

pub async fn run_fetch_with<F: ChannelFactory>(factory: F, job: FetchJob) -> Result<BatchReport> {
    ensure_parent_dir(&job.invalid)?;
    truncate_faults(&job.invalid)?;

    let identifiers = load_identifiers(&job.input)?;
    let total = identifiers.len();

    let mut driver = BatchDriver::new(identifiers, factory, job.config.clone());
    let mut events = driver.progress_events();
    let dropped = tokio::spawn(async move {
        let mut dropped = Vec::new();
        while let Some(event) = events.recv().await {
            if !event.produced_report {
                dropped.push(event.identifier);
            }
        }
        dropped
    });

    let report = driver.run().await;
    drop(driver);
    let report = report?;

    for identifier in dropped.await? {
        warn!("No baseline value for {identifier}; left out of the report");
    }

    ensure_parent_dir(&job.output)?;
    report.save_json(&job.output)?;
    if let Some(csv_path) = &job.csv {
        ensure_parent_dir(csv_path)?;
        report.save_csv(csv_path)?;
    }
    write_faults(&job.invalid, &report.faults)?;

    info!(
        "File {} generated with {} of {} identifiers ({} remote errors logged to {})",
        job.output.display(),
        report.len(),
        total,
        report.faults.len(),
        job.invalid.display()
    );

    Ok(report)
}

/// Print a saved report as a table.
pub fn show_report(path: &Path) -> Result<()> {
    let report = BatchReport::load_json(path)?;
    println!("Loaded {} records from {}", report.len(), path.display());
    if !report.is_empty() {
        print!("{}", report.render_table());
    }
    Ok(())
}

/// Print the fixed lookbacks and the instants they resolve to right now.
pub fn print_offsets() {
    let now = Utc::now();
    for offset in FIXED_OFFSETS {
        println!(
            "{:<7} {:>4}  {}",
            offset.slot_name(),
            offset.to_string(),
            format_utc(offset.resolve(now))
        );
    }
}
