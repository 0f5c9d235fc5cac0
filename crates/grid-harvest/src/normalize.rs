//! Turning raw table snapshots into rows and header labels.

use crate::session::{SourceRow, TableSnapshot};
use crate::types::{HeaderSet, Row, COLUMN_COUNT};

/// Normalize one row's raw cell text.
///
/// Rows narrower than `COLUMN_COUNT` are rejected outright (never padded),
/// extra cells are dropped, each cell is trimmed, and a row left with only
/// empty cells is rejected.
pub fn normalize_row(cells: &[String]) -> Option<Row> {
    if cells.len() < COLUMN_COUNT {
        return None;
    }
    let row = Row::new(
        cells
            .iter()
            .take(COLUMN_COUNT)
            .map(|c| c.trim().to_string())
            .collect(),
    );
    if row.is_blank() {
        None
    } else {
        Some(row)
    }
}

/// Data rows of a snapshot (everything after the first `tr`), normalized.
///
/// `limit` caps how many source rows are considered, before filtering.
pub fn extract_rows(snapshot: &TableSnapshot, limit: Option<usize>) -> Vec<Row> {
    let data = snapshot.rows.iter().skip(1);
    let data: Box<dyn Iterator<Item = &SourceRow>> = match limit {
        Some(n) => Box::new(data.take(n)),
        None => Box::new(data),
    };
    data.filter_map(|r| normalize_row(&r.data_cells)).collect()
}

/// Header labels from the snapshot's first row, preferring `th` over `td`.
///
/// Returns `None` when the table has no rows at all.
pub fn extract_headers(snapshot: &TableSnapshot) -> Option<HeaderSet> {
    let first = snapshot.rows.first()?;
    let cells = if first.header_cells.is_empty() {
        &first.data_cells
    } else {
        &first.header_cells
    };
    Some(HeaderSet::from_extracted(
        cells.iter().map(|c| c.trim().to_string()).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(n: usize, fill: &str) -> Vec<String> {
        (0..n).map(|i| format!("{fill}{i}")).collect()
    }

    fn data_row(cells: Vec<String>) -> SourceRow {
        SourceRow {
            header_cells: Vec::new(),
            data_cells: cells,
        }
    }

    fn header_row(th: Vec<String>, td: Vec<String>) -> SourceRow {
        SourceRow {
            header_cells: th,
            data_cells: td,
        }
    }

    #[test]
    fn test_short_row_dropped() {
        for n in 0..COLUMN_COUNT {
            assert!(normalize_row(&cells(n, "v")).is_none(), "{n} cells");
        }
    }

    #[test]
    fn test_wide_row_truncated_and_trimmed() {
        let mut raw = cells(14, "  v");
        raw[0] = "\n  Ghorasal \t".to_string();
        let row = normalize_row(&raw).unwrap();
        assert_eq!(row.len(), COLUMN_COUNT);
        assert_eq!(row.cells()[0], "Ghorasal");
        assert_eq!(row.cells()[10], "v10");
    }

    #[test]
    fn test_blank_after_trim_dropped() {
        let mut raw = vec!["   ".to_string(); COLUMN_COUNT];
        assert!(normalize_row(&raw).is_none());
        // content past the 11th column does not rescue a blank row
        raw.push("late".to_string());
        assert!(normalize_row(&raw).is_none());
        raw[3] = " x ".to_string();
        assert!(normalize_row(&raw).is_some());
    }

    #[test]
    fn test_extract_rows_skips_header_row() {
        let snapshot = TableSnapshot {
            rows: vec![
                header_row(cells(11, "h"), Vec::new()),
                data_row(cells(11, "a")),
                data_row(cells(5, "short")),
                data_row(vec![String::new(); 11]),
                data_row(cells(12, "b")),
            ],
        };
        let rows = extract_rows(&snapshot, None);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells()[0], "a0");
        assert_eq!(rows[1].cells()[0], "b0");
    }

    #[test]
    fn test_extract_rows_limit_applies_before_filter() {
        let snapshot = TableSnapshot {
            rows: vec![
                header_row(cells(11, "h"), Vec::new()),
                data_row(cells(3, "short")),
                data_row(cells(11, "a")),
                data_row(cells(11, "b")),
            ],
        };
        let rows = extract_rows(&snapshot, Some(2));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells()[0], "a0");
    }

    #[test]
    fn test_headers_prefer_th() {
        let snapshot = TableSnapshot {
            rows: vec![header_row(cells(11, " th"), cells(11, "td"))],
        };
        let headers = extract_headers(&snapshot).unwrap();
        assert_eq!(headers.labels()[0], "th0");
    }

    #[test]
    fn test_headers_fall_back_to_td() {
        let snapshot = TableSnapshot {
            rows: vec![header_row(Vec::new(), cells(4, "td"))],
        };
        let headers = extract_headers(&snapshot).unwrap();
        assert_eq!(headers.len(), COLUMN_COUNT);
        assert_eq!(headers.labels()[3], "td3");
        assert_eq!(headers.labels()[4], "Col_4");
    }

    #[test]
    fn test_headers_empty_table() {
        assert!(extract_headers(&TableSnapshot::default()).is_none());
    }
}
