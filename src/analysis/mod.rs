//! Grouped aggregates computed from the cleaned table.

pub mod aggregator;

pub use aggregator::*;
