//! End-to-end pipeline: collect, merge, normalize, coerce, average, clean, render.

use crate::analysis::{histogram_bins, mean_by_state, mean_by_year, present_values, top_values};
use crate::config::Config;
use crate::error::Result;
use crate::ingest::{load_and_merge, DatasetCollector, MergeOptions, YEAR_COLUMN};
use crate::models::{ParameterTrend, RunSummary};
use crate::report::charts::{STATE_COLUMN, TREND_PARAMETERS};
use crate::report::{ChartOptions, ChartRenderer};
use crate::frame::{column_names, has_column};
use crate::transform::{
    add_averages, clean, coerce_numeric, normalize_columns, AVG_BOD, AVG_PH, NUMERIC_COLUMNS,
};
use chrono::Utc;
use polars::prelude::DataFrame;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub merge: MergeOptions,
    /// Fail when a min/max source column is absent.
    pub strict_columns: bool,
    pub charts: ChartOptions,
}

impl From<&Config> for RunOptions {
    fn from(config: &Config) -> Self {
        Self {
            input_dir: config.general.input_dir.clone(),
            output_dir: config.general.output_dir.clone(),
            merge: MergeOptions {
                skip_malformed_filenames: config.pipeline.skip_malformed_filenames,
                allow_empty_dataset: config.pipeline.allow_empty_dataset,
                show_progress: false,
            },
            strict_columns: config.pipeline.strict_columns,
            charts: ChartOptions {
                histogram_bins: config.charts.histogram_bins,
                top_states: config.charts.top_states,
            },
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Dataset files collected from the input directory.
    pub files: Vec<PathBuf>,
    /// Row count after merging, before cleaning.
    pub rows_merged: usize,
    /// Canonical column labels after normalization.
    pub columns: Vec<String>,
    pub cleaned: DataFrame,
    /// Charts written, in rendering order.
    pub charts: Vec<PathBuf>,
    pub duration_seconds: f64,
}

/// Run every stage in order.
///
/// When no dataset files were found and empty input is allowed, the run
/// completes without writing any chart.
pub fn run(options: &RunOptions) -> Result<PipelineOutcome> {
    let start_time = Instant::now();

    let files = DatasetCollector::new(&options.input_dir).collect()?;
    info!(
        "Found {} dataset files in {}",
        files.len(),
        options.input_dir.display()
    );

    let merged = load_and_merge(&options.input_dir, &files, &options.merge)?;
    let rows_merged = merged.height();

    if merged.width() == 0 {
        info!("Nothing to chart");
        return Ok(PipelineOutcome {
            files,
            rows_merged,
            columns: Vec::new(),
            cleaned: merged,
            charts: Vec::new(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        });
    }

    let normalized = normalize_columns(&merged)?;
    let columns = column_names(&normalized);
    debug!("Normalized columns: {:?}", columns);

    let coerced = coerce_numeric(&normalized, &NUMERIC_COLUMNS)?;
    let averaged = add_averages(&coerced, options.strict_columns)?;
    let cleaned = clean(&averaged)?;
    if cleaned.height() == 0 {
        warn!("No rows with a year and an average pH, charts will be empty");
    }

    let renderer = ChartRenderer::new(&options.output_dir, options.charts.clone())?;
    let charts = renderer.render_all(&cleaned)?;

    Ok(PipelineOutcome {
        files,
        rows_merged,
        columns,
        cleaned,
        charts,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    })
}

impl PipelineOutcome {
    /// Summarize the run with the same aggregates the charts were drawn from.
    pub fn summarize(&self, options: &RunOptions) -> Result<RunSummary> {
        let df = &self.cleaned;
        let charted = has_column(df, AVG_PH);

        let mut trends = Vec::new();
        if charted {
            for (label, column) in TREND_PARAMETERS {
                trends.push(ParameterTrend {
                    label: label.to_string(),
                    column: column.to_string(),
                    points: mean_by_year(df, YEAR_COLUMN, column)?,
                });
            }
        }

        let state_means = if charted && has_column(df, STATE_COLUMN) {
            let states = top_values(df, STATE_COLUMN, options.charts.top_states)?;
            mean_by_state(df, STATE_COLUMN, AVG_PH, &states)?
        } else {
            Vec::new()
        };

        let bod_histogram = if has_column(df, AVG_BOD) {
            let values = present_values(df, AVG_BOD)?;
            Some(histogram_bins(&values, options.charts.histogram_bins))
        } else {
            None
        };

        Ok(RunSummary {
            generated_at: Utc::now(),
            input_dir: options.input_dir.display().to_string(),
            output_dir: options.output_dir.display().to_string(),
            files_collected: self.files.len(),
            rows_merged: self.rows_merged,
            rows_cleaned: df.height(),
            columns: self.columns.clone(),
            trends,
            state_means,
            bod_histogram,
            charts: self
                .charts
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .collect(),
            duration_seconds: self.duration_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::report::charts::{
        BOD_DISTRIBUTION_FILE, PARAMETER_TRENDS_FILE, PH_TREND_FILE, STATE_COMPARISON_FILE,
    };
    use std::path::Path;
    use tempfile::TempDir;

    const HEADER: &str =
        "State Name,Min pH,Max pH,Min Dissolved Oxygen,Max Dissolved Oxygen,Min BOD,Max BOD\n";

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn options(temp_dir: &TempDir) -> RunOptions {
        let input_dir = temp_dir.path().join("water_quality");
        std::fs::create_dir_all(&input_dir).unwrap();
        RunOptions {
            input_dir,
            output_dir: temp_dir.path().join("plots"),
            merge: MergeOptions::default(),
            strict_columns: true,
            charts: ChartOptions::default(),
        }
    }

    #[test]
    fn test_run_two_years() {
        let temp_dir = TempDir::new().unwrap();
        let options = options(&temp_dir);
        write(
            &options.input_dir,
            "2017_lakes.csv",
            &format!("{HEADER}Kerala,7.0,8.0,5.0,7.0,1.0,3.0\nGoa,6.5,7.5,4.0,6.0,2.0,2.0\n"),
        );
        write(
            &options.input_dir,
            "2018_lakes.csv",
            &format!("{HEADER}Kerala,7.2,8.2,5.5,6.5,1.5,2.5\n"),
        );

        let outcome = run(&options).unwrap();

        assert_eq!(outcome.files.len(), 2);
        assert_eq!(outcome.rows_merged, 3);
        assert_eq!(outcome.cleaned.shape(), (3, 11));
        assert!(outcome.columns.contains(&"min_dissolved_oxygen".to_string()));
        for file in [
            PH_TREND_FILE,
            PARAMETER_TRENDS_FILE,
            STATE_COMPARISON_FILE,
            BOD_DISTRIBUTION_FILE,
        ] {
            assert!(options.output_dir.join(file).is_file(), "missing {file}");
        }
        assert_eq!(outcome.charts.len(), 4);

        let summary = outcome.summarize(&options).unwrap();
        let ph = &summary.trends[0];
        assert_eq!(ph.points.len(), 2);
        assert!((ph.points[0].mean - 7.25).abs() < 1e-9);
        assert!((ph.points[1].mean - 7.7).abs() < 1e-9);
        assert_eq!(summary.state_means.len(), 2);
        assert_eq!(summary.state_means[0].state, "Goa");
        assert_eq!(summary.charts.len(), 4);
    }

    #[test]
    fn test_run_without_state_column() {
        let temp_dir = TempDir::new().unwrap();
        let options = options(&temp_dir);
        write(
            &options.input_dir,
            "2020_rivers.csv",
            "Min pH,Max pH,Min Dissolved Oxygen,Max Dissolved Oxygen,Min BOD,Max BOD\n\
             7,8,5,7,1,3\n",
        );

        let outcome = run(&options).unwrap();

        assert_eq!(outcome.charts.len(), 3);
        assert!(!options.output_dir.join(STATE_COMPARISON_FILE).exists());
        let pngs = std::fs::read_dir(&options.output_dir)
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .map(|e| e.path().extension().is_some_and(|x| x == "png"))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(pngs, 3);
    }

    #[test]
    fn test_run_drops_unparseable_ph() {
        let temp_dir = TempDir::new().unwrap();
        let options = options(&temp_dir);
        write(
            &options.input_dir,
            "2019_lakes.csv",
            &format!("{HEADER}Goa,N/A,N/A,5,6,1,2\nGoa,abc,,5,6,1,2\nGoa,7,7.4,5,6,1,2\n"),
        );

        let outcome = run(&options).unwrap();

        assert_eq!(outcome.rows_merged, 3);
        assert_eq!(outcome.cleaned.height(), 1);
    }

    #[test]
    fn test_run_all_bod_missing_still_writes_histogram() {
        let temp_dir = TempDir::new().unwrap();
        let options = options(&temp_dir);
        write(
            &options.input_dir,
            "2021_lakes.csv",
            &format!("{HEADER}Goa,7,8,5,6,,\nGoa,7,8,5,6,-,NA\n"),
        );

        let outcome = run(&options).unwrap();

        assert!(options.output_dir.join(BOD_DISTRIBUTION_FILE).is_file());
        let summary = outcome.summarize(&options).unwrap();
        let bins = summary.bod_histogram.unwrap();
        assert_eq!(bins.counts.iter().sum::<usize>(), 0);
    }

    #[test]
    fn test_run_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut options = options(&temp_dir);

        let err = run(&options).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDataset(_)));

        options.merge.allow_empty_dataset = true;
        let outcome = run(&options).unwrap();
        assert!(outcome.charts.is_empty());
        assert_eq!(outcome.cleaned.shape(), (0, 0));
        assert!(!options.output_dir.exists());

        let summary = outcome.summarize(&options).unwrap();
        assert!(summary.trends.is_empty());
        assert!(summary.bod_histogram.is_none());
    }

    #[test]
    fn test_run_missing_source_column() {
        let temp_dir = TempDir::new().unwrap();
        let mut options = options(&temp_dir);
        write(
            &options.input_dir,
            "2017_lakes.csv",
            "Min pH,Max pH,Min BOD,Max BOD\n7,8,1,3\n",
        );

        let err = run(&options).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(ref c) if c == "min_dissolved_oxygen"));

        options.strict_columns = false;
        let outcome = run(&options).unwrap();
        assert_eq!(outcome.cleaned.height(), 1);
        assert_eq!(outcome.charts.len(), 3);
    }

    #[test]
    fn test_run_options_from_config() {
        let mut config = Config::default();
        config.pipeline.allow_empty_dataset = true;
        config.charts.histogram_bins = 12;

        let options = RunOptions::from(&config);

        assert_eq!(options.input_dir, PathBuf::from("../water_quality"));
        assert!(options.merge.allow_empty_dataset);
        assert!(options.strict_columns);
        assert_eq!(options.charts.histogram_bins, 12);
    }
}
