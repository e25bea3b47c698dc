//! runstats - yearly running statistics from Apple Health exports
//!
//! A CLI tool that streams an `export.xml`, keeps the walking/running
//! workout statistics started in the requested year and prints distance,
//! pace and heart-rate totals.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Error (bad arguments, unreadable export, malformed XML or distance)

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod scanner;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::Config;
use models::YearSummary;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match load_config(&args) {
        Ok(mut config) => {
            config.merge_with_args(&args);
            config
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    debug!("runstats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args, &config) {
        error!("Extraction failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .runstats.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("Created {} with default settings.", config::CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr; stdout carries only the report.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Scan the export and print the report.
fn run(args: &Args, config: &Config) -> Result<()> {
    let start_time = Instant::now();

    let (Some(year), Some(xml_file)) = (args.year, args.xml_file.as_deref()) else {
        anyhow::bail!("A year and an export file are required");
    };

    let criteria = config.criteria(year);
    if criteria.pace.enabled {
        debug!(
            "Pace filter on: dropping records faster than {}s/km",
            criteria.pace.min_seconds_per_km
        );
    }

    info!("Scanning {} for {}", xml_file.display(), year);
    let extraction = analysis::extract_file(xml_file, &criteria)
        .with_context(|| format!("Failed to extract activities from {}", xml_file.display()))?;

    if extraction.records.is_empty() {
        warn!("No running activities found for {}", year);
    }

    let summary = YearSummary::from_extraction(year, &extraction);
    let output = match config.general.format {
        OutputFormat::Text => report::generate_text_report(&summary),
        OutputFormat::Json => report::generate_json_report(&summary, &extraction)?,
    };

    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }

    info!(
        "Done in {:.1}s ({} skipped candidates)",
        start_time.elapsed().as_secs_f64(),
        extraction.rejections.relevant()
    );

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("Warning: ignoring {}: {:#}", config::CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
