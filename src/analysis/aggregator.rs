//! Grouped aggregates over the cleaned table.
//!
//! These feed the charts and the run summary; nothing here is persisted.

use crate::error::Result;
use crate::frame::require_column;
use crate::transform::coerce::to_float;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Mean of a value column for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyMean {
    pub year: i64,
    pub mean: f64,
    /// Number of present values averaged.
    pub count: usize,
}

/// Mean of a value column for one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMean {
    pub state: String,
    pub mean: f64,
    pub count: usize,
}

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBins {
    /// Number of bins.
    pub n_bins: usize,
    /// Bin width.
    pub bin_width: f64,
    /// Bin edges (length = n_bins + 1).
    pub edges: Vec<f64>,
    /// Bin counts.
    pub counts: Vec<usize>,
}

/// Group rows by year and average `value_column`, ascending by year.
///
/// Years where every value is missing are left out.
pub fn mean_by_year(
    df: &DataFrame,
    year_column: &str,
    value_column: &str,
) -> Result<Vec<YearlyMean>> {
    let grouped = group_means(df, col(year_column).cast(DataType::Int64), value_column)?;
    let keys = grouped.column("key")?.i64()?;

    let mut means: Vec<YearlyMean> = keys
        .into_iter()
        .zip(group_stats(&grouped)?)
        .filter_map(|(year, stats)| {
            let (mean, count) = stats?;
            Some(YearlyMean {
                year: year?,
                mean,
                count,
            })
        })
        .collect();

    means.sort_by_key(|m| m.year);
    Ok(means)
}

/// Distinct present values of `column` with their frequency, most frequent first.
///
/// Equal counts keep the order in which the values were first seen.
pub fn value_counts(df: &DataFrame, column: &str) -> Result<Vec<(String, usize)>> {
    require_column(df, column)?;

    let counted = df
        .clone()
        .lazy()
        .select([col(column).cast(DataType::String).alias("value")])
        .with_row_index("row", None)
        .filter(col("value").is_not_null())
        .group_by([col("value")])
        .agg([
            len().cast(DataType::Int64).alias("count"),
            col("row").min().cast(DataType::Int64).alias("first"),
        ])
        .collect()?;

    let values = counted.column("value")?.str()?;
    let counts = counted.column("count")?.i64()?;
    let first = counted.column("first")?.i64()?;

    let mut ranked: Vec<(String, usize, i64)> = values
        .into_iter()
        .zip(counts.into_iter())
        .zip(first.into_iter())
        .filter_map(|((value, count), first)| {
            Some((value?.to_string(), count? as usize, first?))
        })
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    Ok(ranked
        .into_iter()
        .map(|(value, count, _)| (value, count))
        .collect())
}

/// The `n` most frequent values of a column.
pub fn top_values(df: &DataFrame, column: &str, n: usize) -> Result<Vec<String>> {
    Ok(value_counts(df, column)?
        .into_iter()
        .take(n)
        .map(|(value, _)| value)
        .collect())
}

/// Average `value_column` per state, restricted to `states`, ordered by state name.
pub fn mean_by_state(
    df: &DataFrame,
    state_column: &str,
    value_column: &str,
    states: &[String],
) -> Result<Vec<StateMean>> {
    let grouped = group_means(df, col(state_column).cast(DataType::String), value_column)?;
    let keys = grouped.column("key")?.str()?;

    let mut means: Vec<StateMean> = keys
        .into_iter()
        .zip(group_stats(&grouped)?)
        .filter_map(|(state, stats)| {
            let state = state?;
            let (mean, count) = stats?;
            states.iter().any(|s| s == state).then(|| StateMean {
                state: state.to_string(),
                mean,
                count,
            })
        })
        .collect();

    means.sort_by(|a, b| a.state.cmp(&b.state));
    Ok(means)
}

/// Present values of a column as floats, in row order.
pub fn present_values(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
    let values = df
        .clone()
        .lazy()
        .select([to_float(column, require_column(df, column)?.dtype())])
        .collect()?;
    Ok(values.column(column)?.f64()?.into_iter().flatten().collect())
}

/// Bin `data` into `n_bins` equal-width bins spanning its range.
///
/// The last bin is closed on the right. Empty data spans `[0, 1]` and a
/// single distinct value `v` spans `[v - 0.5, v + 0.5]`. Non-finite values
/// are not counted. Edges stay finite even when the range itself
/// overflows `f64`.
pub fn histogram_bins(data: &[f64], n_bins: usize) -> HistogramBins {
    let n_bins = n_bins.max(1);
    let finite: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();

    let (lo, hi) = match (
        finite.iter().copied().reduce(f64::min),
        finite.iter().copied().reduce(f64::max),
    ) {
        (Some(min), Some(max)) if max > min => (min, max),
        (Some(v), Some(_)) => (v - 0.5, v + 0.5),
        _ => (0.0, 1.0),
    };

    // Half the range: finite for any finite `lo` and `hi`.
    let half_span = hi / 2.0 - lo / 2.0;
    let bin_width = half_span / n_bins as f64 * 2.0;
    let edges: Vec<f64> = (0..=n_bins)
        .map(|i| {
            let t = i as f64 / n_bins as f64;
            lo * (1.0 - t) + hi * t
        })
        .collect();

    let mut counts = vec![0usize; n_bins];
    for value in &finite {
        let t = (value / 2.0 - lo / 2.0) / half_span;
        let idx = ((t * n_bins as f64) as usize).min(n_bins - 1);
        counts[idx] += 1;
    }

    HistogramBins {
        n_bins,
        bin_width,
        edges,
        counts,
    }
}

/// Group by `key`, averaging the present values of `value_column`.
fn group_means(df: &DataFrame, key: Expr, value_column: &str) -> Result<DataFrame> {
    let value = to_float(value_column, require_column(df, value_column)?.dtype());

    Ok(df
        .clone()
        .lazy()
        .select([key.alias("key"), value.alias("value")])
        .filter(col("key").is_not_null().and(col("value").is_not_null()))
        .group_by([col("key")])
        .agg([
            col("value").mean().alias("mean"),
            col("value").count().cast(DataType::Int64).alias("count"),
        ])
        .collect()?)
}

fn group_stats(grouped: &DataFrame) -> Result<Vec<Option<(f64, usize)>>> {
    let means = grouped.column("mean")?.f64()?;
    let counts = grouped.column("count")?.i64()?;
    Ok(means
        .into_iter()
        .zip(counts.into_iter())
        .map(|(mean, count)| Some((mean?, count? as usize)))
        .collect())
}
