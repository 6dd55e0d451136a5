//! Whole-file reading: locate, flatten and normalize in one call.

use tracing::{debug, info, warn};

use pos_model::{PipelineOptions, RawCell, RawTable};

use crate::error::Result;
use crate::flatten::{FlatHeader, flatten_header};
use crate::locate::{HeaderLocation, locate_header};
use crate::normalize::{NormalizeStats, normalize_table};
use crate::source::{SheetSource, SourceFormat};

/// A normalized table plus what was learned while reading it.
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub table: RawTable,
    pub location: HeaderLocation,
    pub header_levels: usize,
    pub stats: NormalizeStats,
    pub format: SourceFormat,
    /// Encoding name for CSV input.
    pub encoding: Option<&'static str>,
}

/// Counts rows with non-blank cells past `width`.
pub(crate) fn count_overflow(width: usize, rows: &[Vec<RawCell>]) -> usize {
    rows.iter()
        .filter(|row| row.iter().skip(width).any(|cell| !cell.is_blank()))
        .count()
}

/// Builds and normalizes a table under an already flattened header.
pub(crate) fn assemble_table(columns: &[String], rows: Vec<Vec<RawCell>>) -> (RawTable, NormalizeStats) {
    let truncated = count_overflow(columns.len(), &rows);
    if truncated > 0 {
        warn!(truncated, width = columns.len(), "rows wider than the header were truncated");
    }
    let (table, mut stats) = normalize_table(RawTable::new(columns.to_vec(), rows));
    stats.truncated_rows = truncated;
    (table, stats)
}

/// Locates and flattens the header of `source`.
///
/// Returns the location, the flattened header, and the rows from the header
/// onward.
pub(crate) fn resolve_header(
    source: &SheetSource,
    options: &PipelineOptions,
) -> Result<(HeaderLocation, FlatHeader)> {
    let preview = source.preview(options.header_scan_rows);
    let location = locate_header(&preview)?;
    let head = source.rows_from_limited(location.header_index, 2)?;
    let header_row = head.first().map(Vec::as_slice).unwrap_or_default();
    let flat = flatten_header(header_row, head.get(1).map(Vec::as_slice));
    debug!(
        header_index = location.header_index,
        levels = flat.levels,
        columns = flat.columns.len(),
        "resolved header"
    );
    Ok((location, flat))
}

/// Reads a whole file into a normalized table.
///
/// # Errors
///
/// Fails on empty or undecodable input, unreadable workbooks, and when no
/// header row is found in the scan window.
pub fn read_sheet(bytes: &[u8], filename: &str, options: &PipelineOptions) -> Result<ParsedSheet> {
    let source = SheetSource::load(bytes, filename, options.header_scan_rows)?;
    let (location, flat) = resolve_header(&source, options)?;
    let data_start = location.header_index + flat.levels;
    let rows = source.rows_from(data_start)?;
    let (table, stats) = assemble_table(&flat.columns, rows);
    info!(
        filename,
        rows = table.row_count(),
        columns = table.column_count(),
        "read sheet"
    );
    Ok(ParsedSheet {
        table,
        location,
        header_levels: flat.levels,
        stats,
        format: source.format(),
        encoding: source.encoding(),
    })
}
