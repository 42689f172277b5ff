//! herakles-container-census - version 0.1.0
//!
//! Lists one representative process per running container.
//! This is the main entry point that loads configuration, initializes logging
//! and dispatches subcommands. Without a subcommand it runs a single scan.

mod cli;
mod commands;
mod config;
mod startup_checks;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_generate_snapshot, command_scan};
use config::{resolve_config, show_config, validate_effective_config, Config};

/// Resolves the effective log level (CLI > config > warn).
fn resolve_log_level(config: &Config, args: &Args) -> LevelFilter {
    if let Some(level) = &args.log_level {
        return match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        };
    }

    match config.log_level.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("off") => LevelFilter::OFF,
        Some("error") => LevelFilter::ERROR,
        Some("info") => LevelFilter::INFO,
        Some("debug") => LevelFilter::DEBUG,
        Some("trace") => LevelFilter::TRACE,
        _ => LevelFilter::WARN,
    }
}

/// Initializes tracing logging subsystem with configured log level.
///
/// Diagnostics go to stderr so they never interleave with scan output on stdout.
fn setup_logging(config: &Config, args: &Args) {
    let log_level = resolve_log_level(config, args);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    debug!("Logging initialized with level: {}", log_level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Main application entry point.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    // Config generation does not need a valid effective config
    if let Some(Commands::Config {
        output,
        format,
        commented,
    }) = &args.command
    {
        return command_config(output.clone(), format.clone(), *commented);
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config, &args);

    match &args.command {
        Some(Commands::Check { proc, all }) => command_check(*proc, *all, &config),

        Some(Commands::CheckRequirements) => {
            println!("🔍 Checking Runtime Requirements");
            println!("================================\n");

            match startup_checks::validate_requirements(&config.proc_root()) {
                Ok(_) => {
                    println!("\n✅ All requirements met - ready to scan!");
                    std::process::exit(0);
                }
                Err(e) => {
                    eprintln!("\n❌ Requirements check failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Some(Commands::GenerateSnapshot {
            output,
            containers,
            per_container,
            host_processes,
        }) => command_generate_snapshot(
            output.clone(),
            *containers,
            *per_container,
            *host_processes,
        ),

        Some(Commands::Config { .. }) => unreachable!("Config handled above"),

        Some(Commands::Scan { iterations }) => run_scan(*iterations, &config),
        None => run_scan(1, &config),
    }
}

/// Runs the census, validating /proc access first unless scanning a snapshot.
fn run_scan(iterations: usize, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if config.snapshot_file.is_none() {
        if let Err(e) = startup_checks::validate_requirements(&config.proc_root()) {
            error!("❌ Startup validation failed: {}", e);
            error!("   The scan will run but may miss containers!");
            // Continue anyway - don't fail hard
        }
    }

    info!("Starting container census");
    command_scan(iterations, config)
}
