//! Column lookups on polars data frames.

use crate::error::{PipelineError, Result};
use polars::prelude::*;

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

/// Look up a column, failing with `MissingColumn` when it is absent.
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| PipelineError::MissingColumn(name.to_string()))
}

/// Column labels in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups() {
        let df = df!(
            "year" => &[2017i64, 2018],
            "avg_bod" => &[None, Some(1.5)],
        )
        .unwrap();

        assert!(has_column(&df, "year"));
        assert!(!has_column(&df, "state_name"));
        assert_eq!(column_names(&df), vec!["year", "avg_bod"]);
        assert!(matches!(
            require_column(&df, "min_ph"),
            Err(PipelineError::MissingColumn(ref c)) if c == "min_ph"
        ));
    }
}
