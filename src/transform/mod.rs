//! Table transformations: label normalization, numeric coercion,
//! derived averages and row cleaning.

pub mod averages;
pub mod clean;
pub mod coerce;
pub mod normalize;

pub use averages::{add_averages, AVG_BOD, AVG_DO, AVG_PH};
pub use clean::clean;
pub use coerce::{coerce_numeric, NUMERIC_COLUMNS};
pub use normalize::normalize_columns;
