use std::path::PathBuf;

use pos_core::PipelineOutput;
use pos_model::ReportType;

/// Outcome of `pos-etl ingest` for one file.
#[derive(Debug)]
pub struct IngestResult {
    pub file: PathBuf,
    pub report_type: ReportType,
    /// Whether the report type came from detection rather than a flag.
    pub detected_type: bool,
    pub output: PipelineOutput,
    pub output_path: Option<PathBuf>,
    pub max_issues: usize,
}

impl IngestResult {
    pub fn has_errors(&self) -> bool {
        !self.output.report.is_valid
    }
}
