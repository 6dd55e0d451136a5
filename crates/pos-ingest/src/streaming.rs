//! Chunked reading of large CSV exports.
//!
//! The header is located and flattened once; the data rows are then read in
//! fixed-size chunks, each normalized on its own. A chunk's `offset` is
//! `chunk_index * chunk_size`, which callers add to chunk-local row indices
//! to keep one global numbering.

use std::io::Cursor;

use chrono::NaiveDate;
use tracing::{debug, info_span};

use pos_model::{PipelineOptions, RawTable};

use crate::error::{IngestError, Result};
use crate::locate::HeaderLocation;
use crate::normalize::NormalizeStats;
use crate::reader::{assemble_table, resolve_header};
use crate::source::{SheetSource, SourceFormat, csv_reader, record_to_cells, tail_from_line};

/// Position and shape of one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMeta {
    pub chunk_index: usize,
    /// Global index of the chunk's first data row.
    pub offset: usize,
    /// Data rows read into the chunk, before normalization.
    pub rows: usize,
    pub detected_date: Option<NaiveDate>,
}

/// One chunk of normalized rows.
#[derive(Debug, Clone)]
pub struct TableChunk {
    pub meta: ChunkMeta,
    pub table: RawTable,
    pub stats: NormalizeStats,
}

/// Iterator over the chunks of a CSV export.
pub struct StreamReader {
    records: csv::StringRecordsIntoIter<Cursor<Vec<u8>>>,
    columns: Vec<String>,
    location: HeaderLocation,
    header_levels: usize,
    chunk_size: usize,
    next_index: usize,
    done: bool,
}

impl std::fmt::Debug for StreamReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReader")
            .field("columns", &self.columns)
            .field("location", &self.location)
            .field("chunk_size", &self.chunk_size)
            .field("next_index", &self.next_index)
            .finish_non_exhaustive()
    }
}

impl StreamReader {
    /// Decodes the file, locates its header and prepares chunked reading.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Unstreamable`] for workbook input, and the
    /// usual decoding and header errors otherwise.
    pub fn new(bytes: &[u8], filename: &str, options: &PipelineOptions) -> Result<Self> {
        if SourceFormat::detect(filename, bytes) == SourceFormat::Workbook {
            return Err(IngestError::Unstreamable);
        }
        let source = SheetSource::load(bytes, filename, options.header_scan_rows)?;
        let (location, flat) = resolve_header(&source, options)?;
        let data_start = location.header_index + flat.levels;
        let tail = match &source {
            SheetSource::Csv { text, .. } => tail_from_line(text, data_start).as_bytes().to_vec(),
            SheetSource::Workbook { .. } => return Err(IngestError::Unstreamable),
        };
        debug!(
            filename,
            chunk_size = options.chunk_size,
            data_start,
            "prepared chunked reader"
        );
        Ok(Self {
            records: csv_reader(Cursor::new(tail)).into_records(),
            columns: flat.columns,
            location,
            header_levels: flat.levels,
            chunk_size: options.chunk_size.max(1),
            next_index: 0,
            done: false,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn location(&self) -> &HeaderLocation {
        &self.location
    }

    pub fn header_levels(&self) -> usize {
        self.header_levels
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Iterator for StreamReader {
    type Item = Result<TableChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let chunk_index = self.next_index;
        let _span = info_span!("chunk", chunk_index).entered();
        let mut rows = Vec::with_capacity(self.chunk_size);
        while rows.len() < self.chunk_size {
            match self.records.next() {
                Some(Ok(record)) => rows.push(record_to_cells(&record)),
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err.into()));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        if rows.is_empty() {
            return None;
        }
        self.next_index += 1;
        let meta = ChunkMeta {
            chunk_index,
            offset: chunk_index * self.chunk_size,
            rows: rows.len(),
            detected_date: self.location.detected_date,
        };
        let (table, stats) = assemble_table(&self.columns, rows);
        debug!(offset = meta.offset, rows = meta.rows, "read chunk");
        Some(Ok(TableChunk { meta, table, stats }))
    }
}
