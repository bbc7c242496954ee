//! Run outputs: PNG charts and the optional run summary.

pub mod charts;
pub mod summary;

pub use charts::{ChartOptions, ChartRenderer};
pub use summary::{generate_json_summary, generate_markdown_summary, write_summary};
