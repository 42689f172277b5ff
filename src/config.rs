//! Configuration management for herakles-container-census.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use herakles_container_census::process::{
    DEFAULT_CGROUP_MARKERS, DEFAULT_CGROUP_READ_LIMIT, DEFAULT_PROC_ROOT,
};
use herakles_container_census::{
    BoundPolicy, CensusSettings, OutputFormat, Strategy, DEFAULT_MAX_CONTAINERS,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::cli::{Args, ConfigFormat};

/// Configuration structure; fields missing from a file keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Classification
    pub strategy: Option<Strategy>,
    #[serde(alias = "cgroup-markers")]
    pub cgroup_markers: Option<Vec<String>>,
    #[serde(alias = "cgroup-read-limit")]
    pub cgroup_read_limit: Option<usize>,

    // Bounds
    #[serde(alias = "max-containers")]
    pub max_containers: Option<usize>,
    #[serde(alias = "bound-policy")]
    pub bound_policy: Option<BoundPolicy>,
    #[serde(alias = "max-processes")]
    pub max_processes: Option<usize>,
    #[serde(alias = "scan-timeout-ms")]
    pub scan_timeout_ms: Option<u64>,

    // Process table
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    pub include_names: Option<Vec<String>>,
    pub exclude_names: Option<Vec<String>>,

    /// Path to JSON snapshot file (scans the snapshot instead of /proc)
    #[serde(alias = "snapshot-file")]
    pub snapshot_file: Option<PathBuf>,

    // Output
    #[serde(alias = "output-format")]
    pub output_format: Option<OutputFormat>,

    // Logging
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: Some(Strategy::Namespace),
            cgroup_markers: Some(DEFAULT_CGROUP_MARKERS.iter().map(|s| s.to_string()).collect()),
            cgroup_read_limit: Some(DEFAULT_CGROUP_READ_LIMIT),
            max_containers: Some(DEFAULT_MAX_CONTAINERS),
            bound_policy: Some(BoundPolicy::Saturate),
            max_processes: None,
            scan_timeout_ms: Some(5000),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            include_names: None,
            exclude_names: None,
            snapshot_file: None,
            output_format: Some(OutputFormat::Table),
            log_level: Some("warn".into()),
        }
    }
}

impl Config {
    /// Builds census settings, falling back to defaults for unset fields.
    pub fn census_settings(&self) -> CensusSettings {
        let defaults = CensusSettings::default();
        CensusSettings {
            strategy: self.strategy.unwrap_or(defaults.strategy),
            max_containers: self.max_containers.unwrap_or(defaults.max_containers),
            bound_policy: self.bound_policy.unwrap_or(defaults.bound_policy),
            cgroup_read_limit: self.cgroup_read_limit.unwrap_or(defaults.cgroup_read_limit),
            cgroup_markers: self
                .cgroup_markers
                .clone()
                .unwrap_or(defaults.cgroup_markers),
            max_processes: self.max_processes,
            scan_timeout: self.scan_timeout_ms.map(Duration::from_millis),
            include_names: self.include_names.clone(),
            exclude_names: self.exclude_names.clone(),
        }
    }

    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.max_containers == Some(0) {
        return Err("max_containers must be at least 1".into());
    }

    if cfg.cgroup_read_limit == Some(0) {
        return Err("cgroup_read_limit must be at least 1 byte".into());
    }

    if cfg.max_processes == Some(0) {
        return Err("max_processes must be at least 1 (omit it for no limit)".into());
    }

    if let Some(markers) = &cfg.cgroup_markers {
        if markers.is_empty() {
            return Err("cgroup_markers must contain at least one marker".into());
        }
        if markers.iter().any(|m| m.is_empty()) {
            return Err("cgroup_markers must not contain empty strings".into());
        }
    }

    if let Some(path) = &cfg.snapshot_file {
        if !path.exists() {
            return Err(format!("Snapshot file not found: {}", path.display()).into());
        }
    }

    Ok(())
}

/// Splits a comma-separated CLI list.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(strategy) = args.strategy {
        config.strategy = Some(strategy);
    }
    if let Some(n) = args.max_containers {
        config.max_containers = Some(n);
    }
    if let Some(policy) = args.bound_policy {
        config.bound_policy = Some(policy);
    }
    if let Some(limit) = args.cgroup_read_limit {
        config.cgroup_read_limit = Some(limit);
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if args.max_processes.is_some() {
        config.max_processes = args.max_processes;
    }
    if let Some(ms) = args.scan_timeout_ms {
        config.scan_timeout_ms = Some(ms);
    }

    // Parse comma-separated include/exclude names
    if let Some(include_str) = &args.include_names {
        config.include_names = Some(split_list(include_str));
    }
    if let Some(exclude_str) = &args.exclude_names {
        config.exclude_names = Some(split_list(exclude_str));
    }

    if let Some(format) = args.format {
        config.output_format = Some(format);
    }

    // Snapshot file: CLI wins if provided
    if let Some(snapshot) = &args.snapshot_file {
        config.snapshot_file = Some(snapshot.clone());
    }

    Ok(config)
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        if !p.exists() {
            return Err(format!("Config file not found: {}", p.display()).into());
        }
        p.to_path_buf()
    } else {
        // Try default locations
        let defaults = [
            "/etc/herakles/container-census.yaml",
            "/etc/herakles/container-census.yml",
            "/etc/herakles/container-census.json",
            "./herakles-container-census.yaml",
            "./herakles-container-census.yml",
            "./herakles-container-census.json",
        ];

        match defaults.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        }
    };

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };

    println!("{output}");
    Ok(())
}
