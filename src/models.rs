//! Data models for the run summary.
//!
//! A `RunSummary` captures what one pipeline run read, kept and drew, so it
//! can be written out as Markdown or JSON next to the charts.

use crate::analysis::{HistogramBins, StateMean, YearlyMean};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Yearly means of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterTrend {
    /// Display label, e.g. `pH`.
    pub label: String,
    /// Source column, e.g. `avg_ph`.
    pub column: String,
    pub points: Vec<YearlyMean>,
}

impl ParameterTrend {
    /// Change between the first and last yearly mean, if there are two or more years.
    pub fn overall_change(&self) -> Option<f64> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if self.points.len() > 1 => Some(last.mean - first.mean),
            _ => None,
        }
    }
}

/// Everything worth reporting about one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// When the summary was produced.
    pub generated_at: DateTime<Utc>,
    pub input_dir: String,
    pub output_dir: String,
    /// Dataset files found in the input directory.
    pub files_collected: usize,
    /// Rows after merging, before cleaning.
    pub rows_merged: usize,
    /// Rows left after cleaning.
    pub rows_cleaned: usize,
    /// Canonical column labels.
    pub columns: Vec<String>,
    pub trends: Vec<ParameterTrend>,
    /// Mean pH of the most frequent states; empty without a state column.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub state_means: Vec<StateMean>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bod_histogram: Option<HistogramBins>,
    /// File names of the charts written.
    pub charts: Vec<String>,
    pub duration_seconds: f64,
}

impl RunSummary {
    /// Share of merged rows that survived cleaning, in percent.
    pub fn retention_percent(&self) -> f64 {
        if self.rows_merged == 0 {
            0.0
        } else {
            self.rows_cleaned as f64 * 100.0 / self.rows_merged as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trend(points: &[(i64, f64)]) -> ParameterTrend {
        ParameterTrend {
            label: "pH".to_string(),
            column: "avg_ph".to_string(),
            points: points
                .iter()
                .map(|&(year, mean)| YearlyMean { year, mean, count: 1 })
                .collect(),
        }
    }

    #[test]
    fn test_overall_change() {
        assert_eq!(trend(&[(2017, 7.0), (2018, 7.5), (2019, 8.0)]).overall_change(), Some(1.0));
        assert_eq!(trend(&[(2017, 7.0)]).overall_change(), None);
        assert_eq!(trend(&[]).overall_change(), None);
    }

    #[test]
    fn test_retention_percent() {
        let mut summary = RunSummary {
            generated_at: Utc::now(),
            input_dir: "in".to_string(),
            output_dir: "out".to_string(),
            files_collected: 0,
            rows_merged: 0,
            rows_cleaned: 0,
            columns: Vec::new(),
            trends: Vec::new(),
            state_means: Vec::new(),
            bod_histogram: None,
            charts: Vec::new(),
            duration_seconds: 0.0,
        };
        assert_eq!(summary.retention_percent(), 0.0);

        summary.rows_merged = 8;
        summary.rows_cleaned = 6;
        assert!((summary.retention_percent() - 75.0).abs() < 1e-12);
    }
}
