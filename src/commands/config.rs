//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::Config;

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("herakles-container-census.yaml"),
    };

    let content = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
        ConfigFormat::Toml => toml::to_string_pretty(&config)?,
        ConfigFormat::Yaml => {
            let mut content = serde_yaml::to_string(&config)?;
            if commented {
                content = add_config_comments(content);
            }
            content
        }
    };

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles Container Census Configuration
# ========================================
#
# Classification
# --------------
# strategy: namespace          # namespace | cgroup
# cgroup_markers:              # substrings marking container cgroups
#   - /docker/
#   - docker-
#   - .scope
#   - container
# cgroup_read_limit: 1023      # bytes of /proc/<pid>/cgroup read per process
#
# Bounds
# ------
# max_containers: 50           # distinct containers kept per scan
# bound_policy: saturate       # saturate (keep updating) | stop (end scan)
# max_processes: null          # processes classified per scan (null = all)
# scan_timeout_ms: 5000        # wall-clock budget per scan
#
# Process Table
# -------------
# proc_root: /proc             # proc filesystem mount point
# include_names: null          # only processes whose name contains one of these
# exclude_names: null          # skip processes whose name contains one of these
# snapshot_file: null          # scan a JSON snapshot instead of /proc
#
# Output / Logging
# ----------------
# output_format: table         # table | json | yaml
# log_level: "warn"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}
