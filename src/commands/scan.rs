//! Scan command implementation.
//!
//! Runs the container census and prints the rendered result to stdout.

use herakles_container_census::render::truncation_note;
use herakles_container_census::{render, Census, OutputFormat, ProcFs, ProcessTable, SnapshotTable};
use tracing::{info, warn};

use crate::config::Config;

/// Opens the process table selected by the configuration.
pub fn open_process_table(
    config: &Config,
) -> Result<Box<dyn ProcessTable>, Box<dyn std::error::Error>> {
    match &config.snapshot_file {
        Some(path) => {
            info!("Scanning snapshot file {}", path.display());
            Ok(Box::new(SnapshotTable::load(path)?))
        }
        None => {
            let root = config.proc_root();
            info!("Scanning process table at {}", root.display());
            Ok(Box::new(ProcFs::new(root)))
        }
    }
}

/// Runs `iterations` scans and prints each one.
pub fn command_scan(iterations: usize, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let table = open_process_table(config)?;
    let census = Census::new(config.census_settings());
    let format = config.output_format.unwrap_or(OutputFormat::Table);

    for iteration in 1..=iterations.max(1) {
        if iterations > 1 {
            info!("Scan iteration {}/{}", iteration, iterations);
        }

        let scan = census.run(table.as_ref())?;
        if let Some(note) = truncation_note(&scan) {
            warn!("{}", note);
        }

        print!("{}", render(&scan, format)?);
        if iteration < iterations && format == OutputFormat::Table {
            println!();
        }
    }

    Ok(())
}
