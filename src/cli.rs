//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// runstats - yearly running statistics from an Apple Health export
///
/// Scans `export.xml` for walking/running workout statistics started in the
/// given year and prints the number of runs, total distance, average pace
/// and average heart rate.
///
/// Examples:
///   runstats 2023 apple_health_export/export.xml
///   runstats 2023 export.xml --no-pace-filter
///   runstats 2023 export.xml --format json
///   runstats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Year to report on (by workout start date)
    #[arg(required_unless_present = "init_config")]
    pub year: Option<i32>,

    /// Path to the exported XML file
    #[arg(value_name = "XML_FILE", required_unless_present = "init_config")]
    pub xml_file: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .runstats.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "RUNSTATS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Minimum pace in seconds per kilometer
    ///
    /// Records faster than this are treated as walking and left out.
    #[arg(long, value_name = "SECS", conflicts_with = "no_pace_filter")]
    pub min_pace: Option<f64>,

    /// Keep every record regardless of pace
    #[arg(long)]
    pub no_pace_filter: bool,

    /// Skip records with a malformed distance or end date instead of failing
    #[arg(long)]
    pub skip_malformed: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .runstats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    clap::ValueEnum,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text lines (default)
    #[default]
    Text,
    /// JSON document
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(pace) = self.min_pace {
            if !pace.is_finite() || pace <= 0.0 {
                return Err("Minimum pace must be a positive number of seconds".to_string());
            }
        }

        if let Some(ref path) = self.xml_file {
            if !path.exists() {
                return Err(format!("Export file does not exist: {}", path.display()));
            }
            if path.is_dir() {
                return Err(format!("Export path is a directory: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
