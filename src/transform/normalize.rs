//! Canonical column labels.

use crate::error::Result;
use polars::prelude::*;
use tracing::debug;

/// Canonical form of a column label: trimmed, lower-case, spaces as `_`,
/// parentheses removed.
///
/// Whitespace exposed by removing parentheses is trimmed as well, so a
/// canonical label maps to itself.
pub fn canonical_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace(['(', ')'], "")
        .trim()
        .to_string()
}

/// Rewrite every column label to its canonical form.
///
/// Labels that collapse onto the same canonical label are merged into one
/// column at the position of the first, taking the left-most present value
/// on each row. Sources of differing types are merged as text.
pub fn normalize_columns(df: &DataFrame) -> Result<DataFrame> {
    let mut groups: Vec<(String, Vec<&Column>)> = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let label = canonical_label(column.name());
        match groups.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, sources)) => {
                debug!("Merging column '{}' into '{}'", column.name(), label);
                sources.push(column);
            }
            None => groups.push((label, vec![column])),
        }
    }

    let exprs: Vec<Expr> = groups
        .iter()
        .map(|(label, sources)| match sources.as_slice() {
            [single] => col(single.name().clone()).alias(label.as_str()),
            _ => {
                let same_type = sources.iter().all(|c| c.dtype() == sources[0].dtype());
                let inputs: Vec<Expr> = sources
                    .iter()
                    .map(|c| {
                        let input = col(c.name().clone());
                        if same_type {
                            input
                        } else {
                            input.cast(DataType::String)
                        }
                    })
                    .collect();
                coalesce(&inputs).alias(label.as_str())
            }
        })
        .collect();

    Ok(df.clone().lazy().select(exprs).collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::column_names;

    fn labels_frame(labels: &[&str]) -> DataFrame {
        DataFrame::new(
            labels
                .iter()
                .map(|l| Column::new((*l).into(), &["1"]))
                .collect(),
        )
        .unwrap()
    }

    fn text(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        df.column(name)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(String::from))
            .collect()
    }

    #[test]
    fn test_canonical_label() {
        assert_eq!(canonical_label("Min pH"), "min_ph");
        assert_eq!(canonical_label("  State Name "), "state_name");
        assert_eq!(
            canonical_label("Min Dissolved Oxygen (mg/L)"),
            "min_dissolved_oxygen_mg/l"
        );
        assert_eq!(canonical_label("BOD(mg/L)"), "bodmg/l");
        assert_eq!(canonical_label("year"), "year");
    }

    #[test]
    fn test_whitespace_exposed_by_parentheses_is_trimmed() {
        assert_eq!(canonical_label("(\tOdd)"), "odd");
        assert_eq!(canonical_label(&canonical_label("( Temp )")), canonical_label("( Temp )"));
    }

    #[test]
    fn test_lake_headers() {
        let df = labels_frame(&[
            "Min pH",
            "Max pH",
            "Min Dissolved Oxygen (mg/L)",
            "Max Dissolved Oxygen (mg/L)",
            "Min BOD",
            "Max BOD",
            "State Name",
            "year",
        ]);

        let normalized = normalize_columns(&df).unwrap();

        assert_eq!(
            column_names(&normalized),
            vec![
                "min_ph",
                "max_ph",
                "min_dissolved_oxygen_mg/l",
                "max_dissolved_oxygen_mg/l",
                "min_bod",
                "max_bod",
                "state_name",
                "year",
            ]
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let df = labels_frame(&[
            " Min pH ",
            "Temp (C)",
            "(\tOdd)",
            "UPPER CASE",
            "already_fine",
            "a  b",
        ]);

        let once = normalize_columns(&df).unwrap();
        let twice = normalize_columns(&once).unwrap();

        assert!(once.equals_missing(&twice));
    }

    #[test]
    fn test_colliding_labels_are_merged() {
        let df = df!(
            "Min pH" => &[Some("7"), None],
            "x" => &[None::<&str>, None],
            "min ph" => &[Some("9"), Some("6")],
        )
        .unwrap();

        let normalized = normalize_columns(&df).unwrap();

        assert_eq!(column_names(&normalized), vec!["min_ph", "x"]);
        assert_eq!(
            text(&normalized, "min_ph"),
            vec![Some("7".to_string()), Some("6".to_string())]
        );
    }

    #[test]
    fn test_colliding_labels_of_different_types() {
        let df = df!(
            "Year" => &[Some("2016"), None],
            "year" => &[2017i64, 2017],
        )
        .unwrap();

        let normalized = normalize_columns(&df).unwrap();

        assert_eq!(column_names(&normalized), vec!["year"]);
        assert_eq!(
            text(&normalized, "year"),
            vec![Some("2016".to_string()), Some("2017".to_string())]
        );
    }
}
