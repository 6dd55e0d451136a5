//! Error types for spreadsheet ingestion.

use thiserror::Error;

use pos_model::PipelineError;

/// Errors that can occur while reading a report file.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Decoding Errors ===
    /// The byte buffer is empty.
    #[error("file is empty")]
    EmptyFile,

    /// None of the candidate encodings decoded the header window cleanly.
    #[error("could not decode file with any of: {tried}")]
    Encoding { tried: String },

    // === Parsing Errors ===
    /// Failed to parse delimited text.
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to open or read the workbook.
    #[error("failed to read workbook: {message}")]
    Workbook { message: String },

    /// The workbook has no readable worksheet.
    #[error("workbook has no worksheet")]
    EmptyWorkbook,

    /// Chunked reading is only available for delimited text.
    #[error("chunked reading is not supported for workbook input")]
    Unstreamable,

    // === Header Errors ===
    /// No row in the scan window contains a header keyword.
    #[error("no header row found in the first {scanned} rows")]
    NoHeaderDetected { scanned: usize },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

impl IngestError {
    /// Converts into the fatal pipeline taxonomy.
    pub fn into_pipeline_error(self, filename: &str) -> PipelineError {
        match self {
            Self::NoHeaderDetected { .. } => PipelineError::header(filename, self.to_string()),
            other => PipelineError::parse(filename, other.to_string()),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
