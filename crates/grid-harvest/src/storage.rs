//! CSV output: UTF-8 with a byte-order mark, one header line, fixed-width rows.

use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, TimeZone};
use csv::{ReaderBuilder, Terminator, WriterBuilder};

use crate::types::{Dataset, HarvestResult, HeaderSet, Row};

/// UTF-8 byte-order mark, written first so spreadsheet tools pick the right encoding.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// File name used by sample runs.
pub const SAMPLE_FILE_NAME: &str = "power_grid_sample_11cols.csv";

/// File name for a full run started at `now`.
pub fn timestamped_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("power_grid_data_11cols_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Writer for harvest CSV files.
pub struct CsvWriter;

/// Reader for harvest CSV files.
pub struct CsvReader;

impl CsvWriter {
    /// Write headers and rows to `path`, creating parent directories.
    ///
    /// The file is only created once the whole payload has been encoded.
    pub fn write_to_file(headers: &HeaderSet, dataset: &Dataset, path: &Path) -> HarvestResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut buf = Vec::new();
        Self::write_to(headers, dataset, &mut buf)?;
        std::fs::write(path, buf)?;
        Ok(())
    }

    /// Write headers and rows to any writer.
    pub fn write_to<W: Write>(
        headers: &HeaderSet,
        dataset: &Dataset,
        writer: &mut W,
    ) -> HarvestResult<()> {
        writer.write_all(UTF8_BOM)?;
        let mut csv = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(writer);
        csv.write_record(headers.output_labels())?;
        for record in dataset.records() {
            csv.write_record(&record)?;
        }
        csv.flush()?;
        Ok(())
    }
}

impl CsvReader {
    /// Read a harvest CSV file back into headers and rows.
    pub fn read_from_file(path: &Path) -> HarvestResult<(HeaderSet, Dataset)> {
        let mut file = std::fs::File::open(path)?;
        Self::read_from(&mut file)
    }

    /// Read from any reader. A leading byte-order mark is skipped.
    pub fn read_from<R: Read>(reader: &mut R) -> HarvestResult<(HeaderSet, Dataset)> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes[..]);

        let mut csv = ReaderBuilder::new().has_headers(true).from_reader(body);
        let headers = HeaderSet::new(csv.headers()?.iter().map(String::from).collect());
        let mut dataset = Dataset::new();
        for record in csv.records() {
            dataset.push(Row::new(record?.iter().map(String::from).collect()));
        }
        Ok((headers, dataset))
    }
}
