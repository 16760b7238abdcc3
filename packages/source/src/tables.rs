//! Raw delay tables: parsing, column normalization, and merging.
//!
//! Yearly files on the portal use slightly different column names
//! (`Route` vs `Line`, `Report Date` vs `Date`, ...). Columns are renamed
//! to the canonical names on parse so tables from all years can be merged.
//! Older years are Excel workbooks; their first worksheet is read into the
//! same [`Table`] shape as a CSV file.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader};
use chrono::{NaiveDateTime, NaiveTime};

use crate::SourceError;

/// Field delimiter of the merged delay file.
pub const OUTPUT_DELIMITER: u8 = b'|';

/// An in-memory table of string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names.
    pub headers: Vec<String>,
    /// Rows, each aligned with `headers`.
    pub rows: Vec<Vec<String>>,
}

/// Parses a comma-separated table and applies the column renames.
///
/// # Errors
///
/// Returns [`SourceError::Csv`] if the text is not valid CSV, or
/// [`SourceError::Package`] if it has no header row.
pub fn parse_table(text: &str, renames: &BTreeMap<String, String>) -> Result<Table, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = canonical_headers(reader.headers()?.iter(), renames)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        if let Some(row) = aligned_row(record?.iter(), headers.len()) {
            rows.push(row);
        }
    }

    Ok(Table { headers, rows })
}

/// Reads the first worksheet of an Excel workbook (`.xlsx` or `.xls`) and
/// applies the column renames. The first row holds the column names.
///
/// # Errors
///
/// Returns [`SourceError::Spreadsheet`] if the bytes are not a readable
/// workbook, or [`SourceError::Package`] if it has no worksheet or no
/// header row.
pub fn parse_workbook(
    bytes: &[u8],
    renames: &BTreeMap<String, String>,
) -> Result<Table, SourceError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SourceError::Package {
            message: "workbook contains no worksheet".to_owned(),
        })??;

    let mut sheet_rows = range
        .rows()
        .map(|cells| cells.iter().map(cell_text).collect::<Vec<_>>());
    let header_row = sheet_rows.next().unwrap_or_default();
    let headers = canonical_headers(header_row.iter().map(String::as_str), renames)?;

    let rows = sheet_rows
        .filter_map(|cells| aligned_row(cells.iter().map(String::as_str), headers.len()))
        .collect();

    Ok(Table { headers, rows })
}

/// Trims the header names, drops a leading byte-order mark, and renames
/// historical names to their canonical form.
fn canonical_headers<'a>(
    raw: impl Iterator<Item = &'a str>,
    renames: &BTreeMap<String, String>,
) -> Result<Vec<String>, SourceError> {
    let headers: Vec<String> = raw
        .map(|h| {
            let h = h.trim_start_matches('\u{feff}').trim();
            renames.get(h).cloned().unwrap_or_else(|| h.to_owned())
        })
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(SourceError::Package {
            message: "table contains no header row".to_owned(),
        });
    }
    Ok(headers)
}

/// Trims and pads (or truncates) a row to `width` cells. Blank rows yield
/// `None`.
fn aligned_row<'a>(cells: impl Iterator<Item = &'a str>, width: usize) -> Option<Vec<String>> {
    let mut row: Vec<String> = cells.take(width).map(|c| c.trim().to_owned()).collect();
    if row.iter().all(String::is_empty) {
        return None;
    }
    row.resize(width, String::new());
    Some(row)
}

/// Text of a worksheet cell as it would appear in a CSV export.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        #[allow(clippy::cast_possible_truncation)]
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or_else(|| dt.as_f64().to_string(), |d| datetime_text(dt.as_f64(), d)),
    }
}

/// Formats an Excel date/time cell. Serials below one day carry only a
/// time of day, and whole serials only a date.
fn datetime_text(serial: f64, value: NaiveDateTime) -> String {
    if serial < 1.0 {
        value.format("%H:%M:%S").to_string()
    } else if value.time() == NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Concatenates tables, taking the union of their columns in first-seen
/// order. Cells for columns a table does not have are left empty.
#[must_use]
pub fn merge_tables(tables: Vec<Table>) -> Table {
    let mut headers: Vec<String> = Vec::new();
    for table in &tables {
        for h in &table.headers {
            if !headers.contains(h) {
                headers.push(h.clone());
            }
        }
    }

    let mut rows = Vec::new();
    for table in tables {
        let positions: Vec<Option<usize>> = headers
            .iter()
            .map(|h| table.headers.iter().position(|t| t == h))
            .collect();
        for row in table.rows {
            rows.push(
                positions
                    .iter()
                    .map(|pos| pos.and_then(|i| row.get(i).cloned()).unwrap_or_default())
                    .collect(),
            );
        }
    }

    Table { headers, rows }
}

/// Writes a table as a pipe-separated file with a header row.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be created or written.
pub fn write_pipe_separated(table: &Table, path: &Path) -> Result<(), SourceError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(OUTPUT_DELIMITER)
        .from_path(path)?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
