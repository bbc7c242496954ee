//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// wqviz - yearly water quality charts from a folder of CSV files
///
/// Reads every `<year>_*.csv` file in the input directory, merges and cleans
/// the measurements, and writes PNG charts of pH, dissolved oxygen and BOD.
///
/// Examples:
///   wqviz
///   wqviz --input-dir data/water_quality --output-dir plots
///   wqviz --skip-malformed --lenient-columns
///   wqviz --summary plots/summary.md
///   wqviz --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory holding the yearly CSV files
    ///
    /// Defaults to ../water_quality, or the value in .wqviz.toml.
    #[arg(short, long, value_name = "DIR", env = "WQVIZ_INPUT_DIR")]
    pub input_dir: Option<PathBuf>,

    /// Directory the PNG charts are written to
    ///
    /// Created if missing. Defaults to ../plots, or the value in .wqviz.toml.
    #[arg(short, long, value_name = "DIR", env = "WQVIZ_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .wqviz.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip CSV files whose name does not start with a year
    #[arg(long)]
    pub skip_malformed: bool,

    /// Succeed without charts when no CSV files are found
    #[arg(long)]
    pub allow_empty: bool,

    /// Leave an average missing instead of failing when its min/max columns are absent
    #[arg(long)]
    pub lenient_columns: bool,

    /// Number of bins in the BOD histogram
    #[arg(long, value_name = "N")]
    pub bins: Option<usize>,

    /// Number of most sampled states in the state comparison
    #[arg(long, value_name = "N")]
    pub top_states: Option<usize>,

    /// Also write a run summary to this file
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Run summary format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub summary_format: Option<SummaryFormat>,

    /// Enable verbose logging output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .wqviz.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the run summary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl fmt::Display for SummaryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryFormat::Markdown => write!(f, "markdown"),
            SummaryFormat::Json => write!(f, "json"),
        }
    }
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

        if self.bins == Some(0) {
            return Err("Histogram bins must be at least 1".to_string());
        }

        if self.top_states == Some(0) {
            return Err("Top states must be at least 1".to_string());
        }

        if let Some(ref input_dir) = self.input_dir {
            if input_dir.exists() && !input_dir.is_dir() {
                return Err(format!(
                    "Input path is not a directory: {}",
                    input_dir.display()
                ));
            }
        }

        if let Some(ref output_dir) = self.output_dir {
            if output_dir.exists() && !output_dir.is_dir() {
                return Err(format!(
                    "Output path is not a directory: {}",
                    output_dir.display()
                ));
            }
        }

        Ok(())
    }
}
