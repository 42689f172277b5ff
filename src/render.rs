//! Output formatting for census scans.
//!
//! The table layout mirrors the kernel log listing: fixed-width columns, a
//! separator, a total line and an advisory when nothing was found. Rendering
//! only produces text; writing it out is up to the caller.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::census::{Scan, Truncation};
use crate::process::Strategy;

/// Width of the separator line below the rows.
pub const SEPARATOR_WIDTH: usize = 58;

/// Advisory printed when a scan found no containers.
pub const EMPTY_ADVISORY: &str = "No container processes running";

/// Output format of the `scan` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

fn id_column_title(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Namespace => "C_ID",
        Strategy::Cgroup => "CONTAINER_ID",
    }
}

fn row(id: &str, pid: &str, comm: &str, ppid: &str) -> String {
    format!("{:<12} {:<8} {:<20} {:<8}", id, pid, comm, ppid)
        .trim_end()
        .to_string()
}

/// Renders a scan as table lines.
pub fn render_table(scan: &Scan) -> Vec<String> {
    let mut lines = Vec::with_capacity(scan.containers.len() + 4);

    lines.push(row(id_column_title(scan.strategy), "PID", "COMM", "PPID"));
    for rec in &scan.containers {
        lines.push(row(
            &rec.container_id,
            &rec.pid.to_string(),
            &rec.comm,
            &rec.ppid.to_string(),
        ));
    }
    lines.push("-".repeat(SEPARATOR_WIDTH));
    lines.push(format!("Total found: {}", scan.total()));

    if scan.is_empty() {
        lines.push(EMPTY_ADVISORY.to_string());
    }
    lines
}

/// Human-readable note about an early-terminated walk, if any.
pub fn truncation_note(scan: &Scan) -> Option<String> {
    scan.stats.truncated.map(|t| match t {
        Truncation::BoundReached => format!(
            "Scan stopped at the container limit of {}",
            scan.max_containers
        ),
        Truncation::MaxProcesses => format!(
            "Scan stopped after {} processes",
            scan.stats.processes_examined
        ),
        Truncation::Timeout => "Scan stopped at its time budget".to_string(),
    })
}

/// Renders a scan in the requested format.
pub fn render(scan: &Scan, format: OutputFormat) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        OutputFormat::Table => {
            let mut out = render_table(scan).join("\n");
            out.push('\n');
            out
        }
        OutputFormat::Json => serde_json::to_string_pretty(scan)?,
        OutputFormat::Yaml => serde_yaml::to_string(scan)?,
    };
    Ok(output)
}
