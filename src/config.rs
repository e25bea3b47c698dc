//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.runstats.toml` files.

use crate::analysis::filter::{
    FilterCriteria, NumericPolicy, PaceFilter, DISTANCE_WALKING_RUNNING,
    MIN_RUNNING_PACE_SECONDS_PER_KM, WORKOUT_STATISTICS,
};
use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".runstats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Record filter settings.
    #[serde(default)]
    pub filter: FilterConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,
}

/// Which elements count as runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Element carrying the workout statistics.
    #[serde(default = "default_element_name")]
    pub element_name: String,

    /// Quantity type identifier to match.
    #[serde(default = "default_quantity_type")]
    pub quantity_type: String,

    /// Drop records faster than `min_pace_seconds_per_km`.
    #[serde(default = "default_true")]
    pub pace_filter: bool,

    /// Running threshold in seconds per kilometer.
    #[serde(default = "default_min_pace")]
    pub min_pace_seconds_per_km: f64,

    /// `abort` or `skip` on a malformed distance or end date.
    #[serde(default)]
    pub numeric_policy: NumericPolicy,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            element_name: default_element_name(),
            quantity_type: default_quantity_type(),
            pace_filter: true,
            min_pace_seconds_per_km: default_min_pace(),
            numeric_policy: NumericPolicy::default(),
        }
    }
}

fn default_element_name() -> String {
    WORKOUT_STATISTICS.to_string()
}

fn default_quantity_type() -> String {
    DISTANCE_WALKING_RUNNING.to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_pace() -> f64 {
    MIN_RUNNING_PACE_SECONDS_PER_KM
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.runstats.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(format) = args.format {
            self.general.format = format;
        }

        if let Some(pace) = args.min_pace {
            self.filter.pace_filter = true;
            self.filter.min_pace_seconds_per_km = pace;
        }

        // Flags always override
        if args.no_pace_filter {
            self.filter.pace_filter = false;
        }
        if args.skip_malformed {
            self.filter.numeric_policy = NumericPolicy::Skip;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Build filter criteria for the requested year.
    pub fn criteria(&self, year: i32) -> FilterCriteria {
        FilterCriteria {
            element_name: self.filter.element_name.clone(),
            quantity_type: self.filter.quantity_type.clone(),
            pace: PaceFilter {
                enabled: self.filter.pace_filter,
                min_seconds_per_km: self.filter.min_pace_seconds_per_km,
            },
            numeric_policy: self.filter.numeric_policy,
            ..FilterCriteria::for_year(year)
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
