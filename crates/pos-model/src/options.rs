//! Configuration options for a pipeline run.

use serde::{Deserialize, Serialize};

/// Default absolute slack for monetary equality checks.
pub const DEFAULT_TOLERANCE: f64 = 1.0;
/// Default minimum similarity for accepting a fuzzy column rename.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;
/// Default number of leading rows scanned for the header.
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 20;
/// Default rows per streaming chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 5000;

/// Options controlling header detection, mapping, streaming and validation.
///
/// Passed by reference into every run and never mutated while a run is in
/// progress. Missing keys in a deserialized options file fall back to the
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Absolute monetary-equality slack (currency units).
    pub tolerance: f64,
    /// Similarity (0-1) a fuzzy rename must exceed.
    pub fuzzy_threshold: f64,
    /// Rows scanned for header detection.
    pub header_scan_rows: usize,
    /// Rows per streaming chunk.
    pub chunk_size: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_header_scan_rows(mut self, rows: usize) -> Self {
        self.header_scan_rows = rows.max(1);
        self
    }

    #[must_use]
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }
}
