//! Numeric coercion of measurement columns.

use crate::error::Result;
use crate::frame::has_column;
use polars::prelude::*;
use tracing::debug;

/// Columns expected to hold measurements.
pub const NUMERIC_COLUMNS: [&str; 6] = [
    "min_ph",
    "max_ph",
    "min_dissolved_oxygen",
    "max_dissolved_oxygen",
    "min_bod",
    "max_bod",
];

/// Non-strict cast to `Float64`. Text is stripped of surrounding
/// whitespace first; anything unparseable becomes null.
pub fn to_float(name: &str, dtype: &DataType) -> Expr {
    let input = col(name);
    match dtype {
        DataType::String => input.str().strip_chars(lit(" \t")).cast(DataType::Float64),
        _ => input.cast(DataType::Float64),
    }
}

/// Coerce the listed columns that exist in `df`; absent ones are skipped.
///
/// Infinite and NaN results are nulled too, so every coerced cell is
/// either a finite number or missing.
pub fn coerce_numeric(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let mut casts = Vec::with_capacity(columns.len());
    let mut present = Vec::with_capacity(columns.len());
    for name in columns {
        if !has_column(df, name) {
            debug!("Numeric column '{}' not present, skipping", name);
            continue;
        }
        let dtype = df.column(name)?.dtype().clone();
        casts.push(to_float(name, &dtype));
        present.push(*name);
    }

    let mut coerced = df.clone().lazy().with_columns(casts).collect()?;

    for name in present {
        let before = df.column(name)?.null_count();
        let finite: Float64Chunked = coerced
            .column(name)?
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        let dropped = finite.null_count().saturating_sub(before);
        if dropped > 0 {
            debug!("Column '{}': {} unparseable cells set to missing", name, dropped);
        }
        coerced.with_column(finite.with_name(name.into()).into_series())?;
    }

    Ok(coerced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::column_names;

    fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_coerce_text_with_garbage() {
        let df = df!(
            "min_ph" => &[Some("7.1"), Some("N/A"), None, Some(" 8 "), Some("inf"), Some("BDL")],
            "state_name" => &["Goa"; 6],
        )
        .unwrap();

        let coerced = coerce_numeric(&df, &NUMERIC_COLUMNS).unwrap();

        assert_eq!(
            floats(&coerced, "min_ph"),
            vec![Some(7.1), None, None, Some(8.0), None, None]
        );
        // Non-whitelisted columns are untouched.
        assert_eq!(coerced.column("state_name").unwrap().dtype(), &DataType::String);
        assert_eq!(column_names(&coerced), vec!["min_ph", "state_name"]);
    }

    #[test]
    fn test_coerce_skips_absent_columns() {
        let df = df!("year" => &[2017i64]).unwrap();
        let coerced = coerce_numeric(&df, &NUMERIC_COLUMNS).unwrap();
        assert!(coerced.equals_missing(&df));
    }

    #[test]
    fn test_int_columns_widen() {
        let df = df!("max_bod" => &[Some(3i64), None]).unwrap();
        let coerced = coerce_numeric(&df, &["max_bod"]).unwrap();
        assert_eq!(floats(&coerced, "max_bod"), vec![Some(3.0), None]);
    }
}
