//! Error types for the processing pipeline.
//!
//! Every stage returns `Result<T, PipelineError>`; the binary converts
//! these into `anyhow::Error` at the edge.

use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Cannot derive a year from file name: {0}")]
    MalformedFilename(String),

    #[error("No dataset files found in {}", .0.display())]
    EmptyDataset(PathBuf),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Failed to read CSV {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Data frame operation failed: {0}")]
    Frame(#[from] PolarsError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render {chart}: {message}")]
    Render { chart: String, message: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn render(chart: &str, err: impl std::fmt::Display) -> Self {
        PipelineError::Render {
            chart: chart.to_string(),
            message: err.to_string(),
        }
    }
}
