//! CLI command implementations for herakles-container-census.
//!
//! This module provides implementations for all CLI subcommands:
//! - `scan`: Container census (also the default action)
//! - `check`: System validation
//! - `config`: Configuration file generation
//! - `generate`: Synthetic snapshot generation

pub mod check;
pub mod config;
pub mod generate;
pub mod scan;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use generate::command_generate_snapshot;
pub use scan::command_scan;
