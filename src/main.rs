//! wqviz - Water quality charts from yearly CSV files
//!
//! Merges every `<year>_*.csv` file of an input directory into one table,
//! derives average pH, dissolved oxygen and BOD per sample, and writes
//! trend, comparison and distribution charts as PNG files.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (missing directory, bad file name, missing column, I/O, rendering)

mod analysis;
mod cli;
mod config;
mod error;
mod frame;
mod ingest;
mod models;
mod pipeline;
mod report;
mod transform;

use anyhow::{Context, Result};
use cli::{Args, SummaryFormat};
use config::{Config, CONFIG_FILE_NAME};
use pipeline::RunOptions;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Settings come from the config file with the command line on top
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    if let Err(e) = init_logging(config.log_level(args.quiet)) {
        eprintln!("Warning: {}", e);
    }

    info!("wqviz v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    if let Err(e) = run_visualization(&args, &config) {
        error!("Visualization failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .wqviz.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to change directories, cleaning policies and chart options.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) -> Result<()> {

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the complete visualization workflow.
fn run_visualization(args: &Args, config: &Config) -> Result<()> {
    let mut options = RunOptions::from(config);
    options.merge.show_progress = !args.quiet;

    println!("📂 Reading datasets from: {}", options.input_dir.display());
    let outcome = pipeline::run(&options)
        .with_context(|| format!("Failed to process {}", options.input_dir.display()))?;

    if !args.quiet {
        println!("\nAvailable Columns:");
        for column in &outcome.columns {
            println!("   {}", column);
        }
        let (rows, cols) = outcome.cleaned.shape();
        println!("\nCleaned Dataset Shape: ({}, {})", rows, cols);
    }

    if outcome.charts.is_empty() {
        warn!("No dataset files found, no charts were written");
    }

    if let Some(ref summary_path) = config.summary.path {
        let summary = outcome.summarize(&options)?;
        let content = match config.summary.format {
            SummaryFormat::Json => report::generate_json_summary(&summary)?,
            SummaryFormat::Markdown => report::generate_markdown_summary(&summary),
        };
        report::write_summary(summary_path, &content)?;
        info!(
            "Wrote {} summary to {}",
            config.summary.format,
            summary_path.display()
        );
    }

    println!("\n✅ Visualization completed successfully.");
    println!("   Charts saved to: {}", options.output_dir.display());
    println!("   Duration: {:.1}s", outcome.duration_seconds);

    Ok(())
}

/// Load configuration from file or use defaults, then apply and check
/// the command-line overrides.
///
/// Runs before logging is set up, so problems are printed directly.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(ref config_path) = args.config {
        // Explicit config path
        Config::load(config_path)?
    } else {
        // Default location
        match Config::load_default() {
            Ok(Some(config)) => config,
            Ok(None) => Config::default(),
            Err(e) => {
                eprintln!("Warning: Failed to load {}: {:#}", CONFIG_FILE_NAME, e);
                Config::default()
            }
        }
    };

    config.merge_with_args(args);
    config.validate()?;
    Ok(config)
}
