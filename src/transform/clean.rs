//! Row cleaning.

use crate::error::Result;
use crate::frame::require_column;
use crate::ingest::YEAR_COLUMN;
use crate::transform::averages::AVG_PH;
use polars::prelude::*;
use tracing::info;

/// Columns a row must have a value in to survive cleaning.
pub const REQUIRED_COLUMNS: [&str; 2] = [YEAR_COLUMN, AVG_PH];

/// Keep rows where every `required` column has a value, in their original order.
pub fn drop_incomplete(df: &DataFrame, required: &[&str]) -> Result<DataFrame> {
    for name in required {
        require_column(df, name)?;
    }

    let complete = required
        .iter()
        .map(|name| col(*name).is_not_null())
        .reduce(|acc, present| acc.and(present))
        .unwrap_or_else(|| lit(true));

    let cleaned = df.clone().lazy().filter(complete).collect()?;
    info!(
        "Dropped {} incomplete rows, {} remain",
        df.height() - cleaned.height(),
        cleaned.height()
    );
    Ok(cleaned)
}

/// Drop rows lacking a year or an average pH.
pub fn clean(df: &DataFrame) -> Result<DataFrame> {
    drop_incomplete(df, &REQUIRED_COLUMNS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn test_clean_keeps_complete_rows_in_order() {
        let df = df!(
            "year" => &[Some(2017i64), None, Some(2018), Some(2019)],
            "avg_ph" => &[Some(7.0), Some(7.1), None, Some(7.3)],
            "avg_bod" => &[None, Some(1.0), Some(2.0), None],
        )
        .unwrap();

        let cleaned = clean(&df).unwrap();

        assert_eq!(cleaned.shape(), (2, 3));
        let years: Vec<Option<i64>> =
            cleaned.column("year").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(years, vec![Some(2017), Some(2019)]);
        for name in REQUIRED_COLUMNS {
            assert_eq!(cleaned.column(name).unwrap().null_count(), 0);
        }
        // Other columns keep their missing values.
        assert_eq!(cleaned.column("avg_bod").unwrap().null_count(), 2);
    }

    #[test]
    fn test_clean_requires_columns() {
        let df = df!("year" => &[2017i64]).unwrap();
        assert!(matches!(
            clean(&df),
            Err(PipelineError::MissingColumn(name)) if name == "avg_ph"
        ));
    }
}
