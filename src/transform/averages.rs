//! Derived per-row averages of min/max measurement pairs.

use crate::error::{PipelineError, Result};
use crate::frame::has_column;
use crate::transform::coerce::to_float;
use polars::prelude::*;
use tracing::warn;

/// A derived column and the two columns it averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AveragePair {
    pub target: &'static str,
    pub min: &'static str,
    pub max: &'static str,
}

pub const AVG_PH: &str = "avg_ph";
pub const AVG_DO: &str = "avg_do";
pub const AVG_BOD: &str = "avg_bod";

pub const AVERAGE_PAIRS: [AveragePair; 3] = [
    AveragePair {
        target: AVG_PH,
        min: "min_ph",
        max: "max_ph",
    },
    AveragePair {
        target: AVG_DO,
        min: "min_dissolved_oxygen",
        max: "max_dissolved_oxygen",
    },
    AveragePair {
        target: AVG_BOD,
        min: "min_bod",
        max: "max_bod",
    },
];

/// Append the derived average columns.
///
/// Each average is the mean of whichever of its min/max values are present,
/// and missing only when both are. With `strict` set, an absent source
/// column is an error; otherwise it is treated as all-missing.
pub fn add_averages(df: &DataFrame, strict: bool) -> Result<DataFrame> {
    let mut averages = Vec::with_capacity(AVERAGE_PAIRS.len());
    let mut all_missing = Vec::new();

    for pair in &AVERAGE_PAIRS {
        let mut sources = Vec::with_capacity(2);
        for name in [pair.min, pair.max] {
            if has_column(df, name) {
                sources.push(to_float(name, df.column(name)?.dtype()));
            } else if strict {
                return Err(PipelineError::MissingColumn(name.to_string()));
            } else {
                warn!("Column '{}' is absent, its average will be missing", name);
            }
        }

        if sources.is_empty() {
            all_missing.push(pair.target);
        } else {
            averages.push(mean_horizontal(sources, true)?.alias(pair.target));
        }
    }

    let mut result = df.clone().lazy().with_columns(averages).collect()?;
    for target in all_missing {
        result.with_column(Series::full_null(
            target.into(),
            result.height(),
            &DataType::Float64,
        ))?;
    }

    // Keep the derived columns in pair order whichever way they were built.
    let order: Vec<String> = result
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .filter(|name| !AVERAGE_PAIRS.iter().any(|p| p.target == name.as_str()))
        .chain(AVERAGE_PAIRS.iter().map(|p| p.target.to_string()))
        .collect();

    Ok(result.select(order)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::column_names;

    fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    fn measurements(min_ph: &[Option<f64>], max_ph: &[Option<f64>]) -> DataFrame {
        let n = min_ph.len();
        df!(
            "min_ph" => min_ph,
            "max_ph" => max_ph,
            "min_dissolved_oxygen" => vec![5.0; n],
            "max_dissolved_oxygen" => vec![7.0; n],
            "min_bod" => vec![None::<f64>; n],
            "max_bod" => vec![2.0; n],
        )
        .unwrap()
    }

    #[test]
    fn test_avg_ph_missing_iff_both_missing() {
        let df = measurements(
            &[Some(6.0), None, Some(7.5), None],
            &[Some(8.0), Some(8.2), None, None],
        );

        let result = add_averages(&df, true).unwrap();

        assert_eq!(floats(&result, AVG_PH), vec![Some(7.0), Some(8.2), Some(7.5), None]);
        assert_eq!(floats(&result, AVG_DO), vec![Some(6.0); 4]);
        assert_eq!(floats(&result, AVG_BOD), vec![Some(2.0); 4]);
        assert_eq!(&column_names(&result)[6..], &[AVG_PH, AVG_DO, AVG_BOD]);
    }

    #[test]
    fn test_missing_source_column_policies() {
        let df = df!(
            "min_ph" => &[7.0],
            "max_ph" => &[8.0],
            "max_bod" => &[3.0],
        )
        .unwrap();

        let strict = add_averages(&df, true);
        assert!(matches!(
            strict,
            Err(PipelineError::MissingColumn(name)) if name == "min_dissolved_oxygen"
        ));

        let lenient = add_averages(&df, false).unwrap();
        assert_eq!(floats(&lenient, AVG_PH), vec![Some(7.5)]);
        assert_eq!(lenient.column(AVG_DO).unwrap().null_count(), 1);
        assert_eq!(floats(&lenient, AVG_BOD), vec![Some(3.0)]);
        assert_eq!(&column_names(&lenient)[3..], &[AVG_PH, AVG_DO, AVG_BOD]);
    }

    #[test]
    fn test_text_sources_are_coerced() {
        let df = df!(
            "min_ph" => &["6", "x"],
            "max_ph" => &["8", "7"],
        )
        .unwrap();

        let result = add_averages(&df, false).unwrap();

        assert_eq!(floats(&result, AVG_PH), vec![Some(7.0), Some(7.0)]);
    }
}
