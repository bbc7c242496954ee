//! Year tagging and merging of per-year dataset files.

use crate::error::{PipelineError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Label of the injected year column.
pub const YEAR_COLUMN: &str = "year";

/// Cell texts read as missing values. Empty cells are always missing.
const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Policies for loading and merging.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Skip files whose name has no year prefix instead of failing.
    pub skip_malformed_filenames: bool,
    /// Return an empty frame when no files were collected instead of failing.
    pub allow_empty_dataset: bool,
    /// Show a progress bar while loading.
    pub show_progress: bool,
}

/// Derive the year from a file name such as `2017_lakes.csv`.
pub fn year_from_filename(path: &Path) -> Result<i64> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    name.split('_')
        .next()
        .and_then(|prefix| prefix.trim().parse::<i64>().ok())
        .ok_or(PipelineError::MalformedFilename(name))
}

/// Read a CSV file with a header row, keeping every cell as text.
///
/// Missing-value tokens become nulls. A row with more fields than the
/// header is an error; repeated header labels get a `_duplicated_N` suffix.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let null_values = NA_TOKENS.iter().map(|token| PlSmallStr::from_str(token)).collect();

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(
            CsvParseOptions::default().with_null_values(Some(NullValues::AllColumns(null_values))),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|source| PipelineError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// Add (or overwrite) the year column.
pub fn tag_year(df: DataFrame, year: i64) -> LazyFrame {
    df.lazy().with_column(lit(year).cast(DataType::Int64).alias(YEAR_COLUMN))
}

/// Load every file, tag it with its year and stack the results.
///
/// Columns are aligned by label in first-seen order; a file lacking a
/// column contributes nulls for it.
pub fn load_and_merge(
    root: &Path,
    files: &[PathBuf],
    options: &MergeOptions,
) -> Result<DataFrame> {
    if files.is_empty() {
        if options.allow_empty_dataset {
            warn!("No dataset files in {}, continuing with an empty table", root.display());
            return Ok(DataFrame::empty());
        }
        return Err(PipelineError::EmptyDataset(root.to_path_buf()));
    }

    let progress = if options.show_progress {
        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut frames = Vec::with_capacity(files.len());
    for path in files {
        progress.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        );

        let year = match year_from_filename(path) {
            Ok(year) => year,
            Err(e) if options.skip_malformed_filenames => {
                warn!("Skipping {}: {}", path.display(), e);
                progress.inc(1);
                continue;
            }
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        };

        let df = match read_csv(path) {
            Ok(df) => df,
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        };
        debug!(
            "Loaded {} rows x {} columns from {} (year {})",
            df.height(),
            df.width(),
            path.display(),
            year
        );
        frames.push(tag_year(df, year));
        progress.inc(1);
    }
    progress.finish_and_clear();

    if frames.is_empty() {
        if options.allow_empty_dataset {
            return Ok(DataFrame::empty());
        }
        return Err(PipelineError::EmptyDataset(root.to_path_buf()));
    }

    let merged = concat_lf_diagonal(frames, UnionArgs::default())?.collect()?;
    info!(
        "Merged {} rows x {} columns from {} files",
        merged.height(),
        merged.width(),
        files.len()
    );
    Ok(merged)
}
