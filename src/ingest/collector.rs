//! Dataset file discovery.
//!
//! Lists a single directory (no recursion) and keeps the files whose name
//! carries the tabular extension, in lexicographic order.

use crate::error::{PipelineError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of the files the pipeline knows how to load.
pub const DATASET_EXTENSION: &str = ".csv";

/// Collector for year-wise dataset files.
pub struct DatasetCollector {
    root: PathBuf,
}

impl DatasetCollector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Collect matching files, sorted by file name.
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(PipelineError::DirectoryNotFound(self.root.clone()));
        }

        let entries =
            fs::read_dir(&self.root).map_err(|e| PipelineError::io(&self.root, e))?;

        let mut files: Vec<(String, PathBuf)> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::io(&self.root, e))?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            if self.matches(&path) {
                files.push((name, path));
            } else {
                debug!("Skipping non-dataset entry: {}", name);
            }
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        debug!("Collected {} dataset files from {}", files.len(), self.root.display());

        Ok(files.into_iter().map(|(_, path)| path).collect())
    }

    /// Check if a path is a dataset file.
    pub fn matches(&self, path: &Path) -> bool {
        let is_dataset_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(DATASET_EXTENSION));

        is_dataset_name && path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_sorted_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join("2019_lakes.csv"), "a\n1\n").unwrap();
        std::fs::write(root.join("2017_lakes.csv"), "a\n1\n").unwrap();
        std::fs::write(root.join("notes.txt"), "ignore me").unwrap();
        std::fs::write(root.join("2018_lakes.CSV"), "a\n1\n").unwrap();
        std::fs::create_dir(root.join("2020_dir.csv")).unwrap();

        let files = DatasetCollector::new(root).collect().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["2017_lakes.csv", "2019_lakes.csv"]);
    }

    #[test]
    fn test_collect_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let files = DatasetCollector::new(temp_dir.path()).collect().unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_collect_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let result = DatasetCollector::new(&missing).collect();

        assert!(matches!(result, Err(PipelineError::DirectoryNotFound(p)) if p == missing));
    }
}
