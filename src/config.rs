//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.wqviz.toml` files.

use crate::cli::SummaryFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".wqviz.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Ingestion and cleaning policies.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Chart settings.
    #[serde(default)]
    pub charts: ChartsConfig,

    /// Run summary settings.
    #[serde(default)]
    pub summary: SummaryConfig,
}

/// Input and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding the `<year>_*.csv` files.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Directory the charts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            verbose: false,
        }
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("../water_quality")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("../plots")
}

/// What to do when the input is not what the pipeline expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Skip files without a year prefix instead of failing.
    #[serde(default)]
    pub skip_malformed_filenames: bool,

    /// Finish without charts when the input directory has no dataset files.
    #[serde(default)]
    pub allow_empty_dataset: bool,

    /// Fail when a min/max source column is absent.
    /// If false the derived average is left entirely missing.
    #[serde(default = "default_true")]
    pub strict_columns: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            skip_malformed_filenames: false,
            allow_empty_dataset: false,
            strict_columns: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Chart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsConfig {
    /// Number of bins in the BOD histogram.
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    /// Number of most frequent states to compare.
    #[serde(default = "default_top_states")]
    pub top_states: usize,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            histogram_bins: default_histogram_bins(),
            top_states: default_top_states(),
        }
    }
}

fn default_histogram_bins() -> usize {
    30
}

fn default_top_states() -> usize {
    5
}

/// Run summary settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Where to write the summary. No summary is written when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Summary format.
    #[serde(default)]
    pub format: SummaryFormat,
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
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input_dir) = args.input_dir {
            self.general.input_dir = input_dir.clone();
        }
        if let Some(ref output_dir) = args.output_dir {
            self.general.output_dir = output_dir.clone();
        }

        // Policy flags only ever relax the configured behavior
        if args.skip_malformed {
            self.pipeline.skip_malformed_filenames = true;
        }
        if args.allow_empty {
            self.pipeline.allow_empty_dataset = true;
        }
        if args.lenient_columns {
            self.pipeline.strict_columns = false;
        }

        if let Some(bins) = args.bins {
            self.charts.histogram_bins = bins;
        }
        if let Some(top) = args.top_states {
            self.charts.top_states = top;
        }

        if let Some(ref summary) = args.summary {
            self.summary.path = Some(summary.clone());
        }
        if let Some(format) = args.summary_format {
            self.summary.format = format;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check the merged settings before a run.
    pub fn validate(&self) -> Result<()> {
        if self.charts.histogram_bins == 0 {
            anyhow::bail!("charts.histogram_bins must be at least 1");
        }
        if self.charts.top_states == 0 {
            anyhow::bail!("charts.top_states must be at least 1");
        }
        Ok(())
    }

    /// Logging level for the merged settings. `quiet` wins over `verbose`.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
