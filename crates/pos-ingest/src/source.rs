//! Raw, header-less access to CSV and workbook sources.

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use tracing::debug;

use pos_model::RawCell;
use pos_model::value::excel_serial_to_datetime;

use crate::encoding::decode_text;
use crate::error::{IngestError, Result};

/// Container format of an uploaded report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    /// Picks the format from the filename extension, sniffing magic bytes
    /// when the extension is missing or unknown.
    pub fn detect(filename: &str, bytes: &[u8]) -> Self {
        let lower = filename.to_lowercase();
        if lower.ends_with(".csv") || lower.ends_with(".txt") {
            return Self::Csv;
        }
        if [".xlsx", ".xlsm", ".xlsb", ".xls", ".ods"]
            .iter()
            .any(|ext| lower.ends_with(ext))
        {
            return Self::Workbook;
        }
        // zip container (xlsx/ods) or OLE compound file (xls)
        if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
            Self::Workbook
        } else {
            Self::Csv
        }
    }
}

/// A header-less grid read from the source.
#[derive(Debug, Clone)]
pub enum SheetSource {
    /// Decoded CSV text; rows are parsed lazily from a header line onward.
    Csv {
        text: String,
        encoding: &'static str,
    },
    /// All rows of the first worksheet.
    Workbook { rows: Vec<Vec<RawCell>> },
}

impl SheetSource {
    /// Reads the bytes as the detected format.
    pub fn load(bytes: &[u8], filename: &str, scan_rows: usize) -> Result<Self> {
        if bytes.is_empty() {
            return Err(IngestError::EmptyFile);
        }
        match SourceFormat::detect(filename, bytes) {
            SourceFormat::Csv => {
                let decoded = decode_text(bytes, scan_rows)?;
                Ok(Self::Csv {
                    text: decoded.text,
                    encoding: decoded.encoding.name(),
                })
            }
            SourceFormat::Workbook => Ok(Self::Workbook {
                rows: read_workbook_rows(bytes)?,
            }),
        }
    }

    pub fn format(&self) -> SourceFormat {
        match self {
            Self::Csv { .. } => SourceFormat::Csv,
            Self::Workbook { .. } => SourceFormat::Workbook,
        }
    }

    pub fn encoding(&self) -> Option<&'static str> {
        match self {
            Self::Csv { encoding, .. } => Some(encoding),
            Self::Workbook { .. } => None,
        }
    }

    /// Text of the first `rows` rows for header scanning.
    ///
    /// CSV rows are physical lines, so metadata lines with a different field
    /// count keep their line position.
    pub fn preview(&self, rows: usize) -> Vec<String> {
        match self {
            Self::Csv { text, .. } => text.lines().take(rows).map(str::to_string).collect(),
            Self::Workbook { rows: grid } => grid
                .iter()
                .take(rows)
                .map(|row| {
                    row.iter()
                        .map(RawCell::to_text)
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect(),
        }
    }

    /// All rows starting at row `start`, split into cells.
    pub fn rows_from(&self, start: usize) -> Result<Vec<Vec<RawCell>>> {
        match self {
            Self::Csv { text, .. } => {
                let mut rows = Vec::new();
                for record in csv_records(tail_from_line(text, start)) {
                    rows.push(record_to_cells(&record?));
                }
                Ok(rows)
            }
            Self::Workbook { rows } => Ok(rows.iter().skip(start).cloned().collect()),
        }
    }

    /// At most `limit` rows starting at row `start`.
    pub fn rows_from_limited(&self, start: usize, limit: usize) -> Result<Vec<Vec<RawCell>>> {
        match self {
            Self::Csv { text, .. } => {
                let mut rows = Vec::with_capacity(limit);
                for record in csv_records(tail_from_line(text, start)).take(limit) {
                    rows.push(record_to_cells(&record?));
                }
                Ok(rows)
            }
            Self::Workbook { rows } => Ok(rows.iter().skip(start).take(limit).cloned().collect()),
        }
    }
}

/// The suffix of `text` beginning at physical line `line`.
pub(crate) fn tail_from_line(text: &str, line: usize) -> &str {
    let mut offset = 0;
    for (idx, segment) in text.split_inclusive('\n').enumerate() {
        if idx == line {
            return &text[offset..];
        }
        offset += segment.len();
    }
    ""
}

pub(crate) fn csv_reader<R: std::io::Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
}

fn csv_records(text: &str) -> csv::StringRecordsIntoIter<&[u8]> {
    csv_reader(text.as_bytes()).into_records()
}

pub(crate) fn record_to_cells(record: &csv::StringRecord) -> Vec<RawCell> {
    record.iter().map(RawCell::text).collect()
}

/// Reads every row of the first worksheet.
pub fn read_workbook_rows(bytes: &[u8]) -> Result<Vec<Vec<RawCell>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|err| {
        IngestError::Workbook {
            message: err.to_string(),
        }
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::EmptyWorkbook)?
        .map_err(|err| IngestError::Workbook {
            message: err.to_string(),
        })?;
    let rows: Vec<Vec<RawCell>> = range
        .rows()
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect();
    debug!(rows = rows.len(), "read worksheet");
    Ok(rows)
}

/// Converts a workbook cell into a raw cell.
pub fn data_to_cell(data: &Data) -> RawCell {
    match data {
        Data::Int(value) => RawCell::Number(*value as f64),
        Data::Float(value) => RawCell::Number(*value),
        Data::String(text) => RawCell::text(text.as_str()),
        Data::Bool(flag) => RawCell::Text(flag.to_string()),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map_or(RawCell::Number(dt.as_f64()), RawCell::DateTime),
        Data::DateTimeIso(text) | Data::DurationIso(text) => RawCell::text(text.as_str()),
        _ => RawCell::Blank,
    }
}
