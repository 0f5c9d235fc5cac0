//! Core data types for harvested rows, headers, and run outcomes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Number of leading columns kept from every table row.
pub const COLUMN_COUNT: usize = 11;

/// One accepted table row: trimmed cell text, at most `COLUMN_COUNT` wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<String>,
}

impl Row {
    /// Wrap already-normalized cells.
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True when every cell is the empty string.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }

    /// Cells padded with empty strings or truncated to exactly `width`.
    pub fn fitted(&self, width: usize) -> Vec<String> {
        let mut out: Vec<String> = self.cells.iter().take(width).cloned().collect();
        out.resize(width, String::new());
        out
    }
}

/// Column labels captured once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSet {
    labels: Vec<String>,
}

impl HeaderSet {
    /// Use `labels` verbatim.
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Labels read from the page: the first `COLUMN_COUNT` are kept and any
    /// missing positions get `Col_{index}` placeholders.
    pub fn from_extracted(labels: Vec<String>) -> Self {
        let mut labels: Vec<String> = labels.into_iter().take(COLUMN_COUNT).collect();
        let found = labels.len();
        labels.extend((found..COLUMN_COUNT).map(placeholder_label));
        Self { labels }
    }

    /// `Column_1` .. `Column_11`, used when headers cannot be read at all.
    pub fn synthetic() -> Self {
        Self {
            labels: (1..=COLUMN_COUNT).map(|i| format!("Column_{i}")).collect(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Exactly `COLUMN_COUNT` labels for the output file's header line.
    pub fn output_labels(&self) -> Vec<String> {
        let mut out: Vec<String> = self.labels.iter().take(COLUMN_COUNT).cloned().collect();
        let found = out.len();
        out.extend((found..COLUMN_COUNT).map(placeholder_label));
        out
    }
}

fn placeholder_label(index: usize) -> String {
    format!("Col_{index}")
}

/// All rows accumulated over one run, in harvest order. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn extend<I: IntoIterator<Item = Row>>(&mut self, rows: I) {
        self.rows.extend(rows);
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every row fitted to exactly `COLUMN_COUNT` cells.
    pub fn records(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(|r| r.fitted(COLUMN_COUNT))
    }
}

impl FromIterator<Row> for Dataset {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Terminal artifact of one harvest invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    pub output_path: Option<PathBuf>,
    pub row_count: usize,
    pub pages_visited: usize,
    pub error: Option<String>,
}

impl RunResult {
    /// A run that wrote `row_count` rows to `path`.
    pub fn written(path: PathBuf, row_count: usize, pages_visited: usize) -> Self {
        Self {
            success: true,
            output_path: Some(path),
            row_count,
            pages_visited,
            error: None,
        }
    }

    /// A run that ended without writing a file.
    pub fn failed(error: &HarvestError, pages_visited: usize) -> Self {
        Self {
            success: false,
            output_path: None,
            row_count: 0,
            pages_visited,
            error: Some(error.to_string()),
        }
    }
}

/// Errors that can occur while harvesting.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("Session error: {0}")]
    Session(String),

    #[error("Timed out after {waited_ms}ms waiting for a table")]
    Timeout { waited_ms: u64 },

    #[error("No data extracted")]
    NoData,

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type HarvestResult<T> = Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_row_fitted_pads_and_truncates() {
        let short = Row::new(strings(&["a", "b"]));
        let fitted = short.fitted(4);
        assert_eq!(fitted, strings(&["a", "b", "", ""]));

        let long = Row::new(strings(&["1", "2", "3", "4", "5"]));
        assert_eq!(long.fitted(3), strings(&["1", "2", "3"]));
    }

    #[test]
    fn test_row_is_blank() {
        assert!(Row::new(strings(&["", "", ""])).is_blank());
        assert!(!Row::new(strings(&["", "x", ""])).is_blank());
    }

    #[test]
    fn test_synthetic_headers() {
        let h = HeaderSet::synthetic();
        assert_eq!(h.len(), COLUMN_COUNT);
        assert_eq!(h.labels()[0], "Column_1");
        assert_eq!(h.labels()[10], "Column_11");
    }

    #[test]
    fn test_extracted_headers_padded_with_placeholders() {
        let h = HeaderSet::from_extracted(strings(&["Plant", "Capacity"]));
        assert_eq!(h.len(), COLUMN_COUNT);
        assert_eq!(h.labels()[1], "Capacity");
        assert_eq!(h.labels()[2], "Col_2");
        assert_eq!(h.labels()[10], "Col_10");
    }

    #[test]
    fn test_extracted_headers_truncated() {
        let labels: Vec<String> = (0..15).map(|i| format!("H{i}")).collect();
        let h = HeaderSet::from_extracted(labels);
        assert_eq!(h.len(), COLUMN_COUNT);
        assert_eq!(h.labels()[10], "H10");
    }

    #[test]
    fn test_output_labels_pads_short_set() {
        let h = HeaderSet::new(strings(&["A"]));
        let out = h.output_labels();
        assert_eq!(out.len(), COLUMN_COUNT);
        assert_eq!(out[0], "A");
        assert_eq!(out[1], "Col_1");
    }

    #[test]
    fn test_dataset_keeps_duplicates() {
        let row = Row::new(strings(&["same"]));
        let mut ds = Dataset::new();
        ds.push(row.clone());
        ds.push(row);
        assert_eq!(ds.len(), 2);
        assert!(ds.records().all(|r| r.len() == COLUMN_COUNT));
    }

    #[test]
    fn test_run_result_failed_has_no_path() {
        let r = RunResult::failed(&HarvestError::NoData, 3);
        assert!(!r.success);
        assert!(r.output_path.is_none());
        assert_eq!(r.row_count, 0);
        assert_eq!(r.pages_visited, 3);
        assert_eq!(r.error.as_deref(), Some("No data extracted"));
    }

    #[test]
    fn test_run_result_serialization() {
        let r = RunResult::written(PathBuf::from("out.csv"), 12, 3);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"row_count\":12"));
        let parsed: RunResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, r);
    }
}
