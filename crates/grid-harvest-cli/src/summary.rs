//! Post-run summary output.

use std::fmt::Write as _;
use std::path::Path;

use grid_harvest::{CsvReader, Dataset, HeaderSet, Row, RunResult};

/// Rows shown from each end of the file.
pub const PREVIEW_ROWS: usize = 5;

/// Print the outcome of a run, as JSON or as a readable summary.
pub fn print(result: &RunResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    if !result.success {
        println!();
        println!(
            "Harvest failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
        return Ok(());
    }

    match &result.output_path {
        Some(path) => print!("{}", render(result, path)?),
        None => println!("Harvest finished with {} rows", result.row_count),
    }
    Ok(())
}

/// Read the written file back and render the summary text.
pub fn render(result: &RunResult, path: &Path) -> anyhow::Result<String> {
    let (headers, dataset) = CsvReader::read_from_file(path)?;
    Ok(render_summary(result, path, &headers, &dataset))
}

fn render_summary(result: &RunResult, path: &Path, headers: &HeaderSet, dataset: &Dataset) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "HARVEST COMPLETED");
    let _ = writeln!(out, "File:    {}", path.display());
    let _ = writeln!(out, "Rows:    {}", dataset.len());
    let _ = writeln!(out, "Columns: {}", headers.len());
    let _ = writeln!(out, "Pages:   {}", result.pages_visited);

    if dataset.is_empty() {
        return out;
    }

    let rows = dataset.rows();
    let head: Vec<(usize, &Row)> = rows.iter().enumerate().take(PREVIEW_ROWS).collect();
    let tail_start = rows.len().saturating_sub(PREVIEW_ROWS);
    let tail: Vec<(usize, &Row)> = rows.iter().enumerate().skip(tail_start).collect();

    let _ = writeln!(out);
    let _ = writeln!(out, "First {} rows:", head.len());
    out.push_str(&format_table(headers, &head));
    let _ = writeln!(out);
    let _ = writeln!(out, "Last {} rows:", tail.len());
    out.push_str(&format_table(headers, &tail));
    out
}

/// Render indexed rows as a column-aligned text table.
pub fn format_table(headers: &HeaderSet, rows: &[(usize, &Row)]) -> String {
    let labels = headers.output_labels();
    let index_width = rows
        .iter()
        .map(|(i, _)| i.to_string().len())
        .max()
        .unwrap_or(0);

    let mut widths: Vec<usize> = labels.iter().map(|l| l.chars().count()).collect();
    for (_, row) in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&" ".repeat(index_width));
    for (label, width) in labels.iter().zip(&widths) {
        out.push_str("  ");
        out.push_str(&pad(label, *width));
    }
    out.push('\n');

    for (index, row) in rows {
        out.push_str(&format!("{index:<index_width$}"));
        for (i, width) in widths.iter().enumerate() {
            let cell = row.cells().get(i).map(String::as_str).unwrap_or("");
            out.push_str("  ");
            out.push_str(&pad(cell, *width));
        }
        out.push('\n');
    }
    out
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.chars().count());
    format!("{text}{}", " ".repeat(fill))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_harvest::{CsvWriter, COLUMN_COUNT};

    fn dataset(n: usize) -> Dataset {
        (0..n)
            .map(|i| Row::new((0..COLUMN_COUNT).map(|c| format!("r{i}c{c}")).collect()))
            .collect()
    }

    #[test]
    fn test_table_columns_align() {
        let headers = HeaderSet::from_extracted(vec!["Plant".into(), "MW".into()]);
        let mut cells = vec![String::new(); COLUMN_COUNT];
        cells[0] = "Ghorasal".into();
        cells[1] = "210".into();
        let long = Row::new(cells);
        let short = Row::new(vec!["X".to_string(); COLUMN_COUNT]);

        let table = format_table(&headers, &[(0, &long), (10, &short)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        let col = lines[0].find("MW").unwrap();
        assert_eq!(&lines[1][col..col + 3], "210");
        assert_eq!(&lines[2][col..col + 1], "X");
        assert!(lines[2].starts_with("10"));
    }

    #[test]
    fn test_summary_shows_head_and_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        CsvWriter::write_to_file(&HeaderSet::synthetic(), &dataset(12), &path).unwrap();
        let result = RunResult::written(path.clone(), 12, 3);

        let text = render(&result, &path).unwrap();
        assert!(text.contains("Rows:    12"));
        assert!(text.contains("Columns: 11"));
        assert!(text.contains("Pages:   3"));
        assert!(text.contains("r0c0"));
        assert!(text.contains("r4c0"));
        assert!(!text.contains("r5c0"));
        assert!(!text.contains("r6c0"));
        assert!(text.contains("r7c0"));
        assert!(text.contains("r11c10"));
    }

    #[test]
    fn test_small_dataset_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        CsvWriter::write_to_file(&HeaderSet::synthetic(), &dataset(2), &path).unwrap();
        let result = RunResult::written(path.clone(), 2, 1);

        let text = render(&result, &path).unwrap();
        assert!(text.contains("First 2 rows:"));
        assert!(text.contains("Last 2 rows:"));
    }

    #[test]
    fn test_render_missing_file() {
        let result = RunResult::written("/nonexistent/out.csv".into(), 1, 1);
        assert!(render(&result, Path::new("/nonexistent/out.csv")).is_err());
    }
}
