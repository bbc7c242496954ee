//! Dataset ingestion: file discovery, year tagging and merging.

pub mod collector;
pub mod merger;

pub use collector::DatasetCollector;
pub use merger::{load_and_merge, MergeOptions, YEAR_COLUMN};
