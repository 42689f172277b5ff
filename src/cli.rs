//! CLI arguments and subcommands for herakles-container-census.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use herakles_container_census::{BoundPolicy, OutputFormat, Strategy};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (git ",
    env!("VERGEN_GIT_SHA"),
    ", built ",
    env!("VERGEN_BUILD_TIMESTAMP"),
    ")"
);

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-container-census",
    about = "List one representative process per running container",
    long_about = "List one representative process per running container.\n\n\
                  Walks /proc, classifies every process as containerized by comparing its \
                  PID and network namespaces with the host (namespace strategy) or by \
                  matching runtime markers in its cgroup membership (cgroup strategy), and \
                  prints the lowest-pid process of each container.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version,
    long_version = LONG_VERSION,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (diagnostics go to stderr) [default: warn]
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Classification strategy
    #[arg(short = 's', long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Maximum number of distinct containers per scan
    #[arg(long)]
    pub max_containers: Option<usize>,

    /// Behavior once the container limit is reached
    #[arg(long, value_enum)]
    pub bound_policy: Option<BoundPolicy>,

    /// Bytes of /proc/<pid>/cgroup read per process
    #[arg(long)]
    pub cgroup_read_limit: Option<usize>,

    /// Mount point of the proc filesystem
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Maximum number of processes to classify per scan
    #[arg(long)]
    pub max_processes: Option<usize>,

    /// Wall-clock budget per scan in milliseconds
    #[arg(long)]
    pub scan_timeout_ms: Option<u64>,

    /// Include only processes matching these names (comma-separated)
    #[arg(long)]
    pub include_names: Option<String>,

    /// Exclude processes matching these names (comma-separated)
    #[arg(long)]
    pub exclude_names: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Path to JSON snapshot file (scans the snapshot instead of /proc)
    #[arg(short = 't', long)]
    pub snapshot_file: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one container scan (default when no subcommand is given)
    Scan {
        /// Repeat the scan N times
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,
    },

    /// Validate configuration and /proc accessibility
    Check {
        /// Check /proc filesystem
        #[arg(long)]
        proc: bool,

        /// Check all system requirements
        #[arg(long)]
        all: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Generate a synthetic process snapshot JSON file
    GenerateSnapshot {
        /// Output file path
        #[arg(short = 'o', long, default_value = "snapshot.json")]
        output: PathBuf,

        /// Number of containers to simulate
        #[arg(long, default_value_t = 5)]
        containers: usize,

        /// Processes per container
        #[arg(long, default_value_t = 3)]
        per_container: usize,

        /// Number of host processes
        #[arg(long, default_value_t = 20)]
        host_processes: usize,
    },

    /// Check runtime requirements and permissions
    CheckRequirements,
}
