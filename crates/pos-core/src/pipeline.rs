//! The ingestion pipeline over one file.
//!
//! Stages per table: pack dynamic payment columns, map labels to canonical
//! fields, coerce values, backfill the business date, check business rules
//! and assemble the report. Streaming runs the same stages per chunk and
//! merges the results.

use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use pos_ingest::{IngestError, NormalizeStats, StreamReader, read_sheet};
use pos_map::{FieldMapper, pack_dynamic_columns};
use pos_model::{
    CanonicalRecord, FILE_LEVEL_ROW, IssueKind, IssueLog, PipelineOptions, RawTable, ReportType,
    Result, ValidationIssue, ValidationReport,
};
use pos_transform::{TypeCoercer, backfill_business_date};
use pos_validate::{BusinessRuleValidator, FileContext, build_report};

/// Cleaned records of a file and the report describing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub records: Vec<CanonicalRecord>,
    pub report: ValidationReport,
}

impl PipelineOutput {
    /// Appends the output of the next chunk, shifting its row indices by `offset`.
    fn absorb(&mut self, other: PipelineOutput, offset: usize) {
        self.records.extend(other.records);
        self.report.merge(other.report.renumbered(offset as i64));
    }
}

/// File-level inputs shared by every table of one run.
#[derive(Debug, Clone, Copy)]
struct RunContext<'a> {
    filename: &'a str,
    report_type: ReportType,
    detected_date: Option<NaiveDate>,
}

/// Runs report files through every stage.
#[derive(Debug, Clone, Default)]
pub struct IngestPipeline {
    options: PipelineOptions,
}

impl IngestPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Reads and processes a whole file.
    ///
    /// `date_hint` stands in for the date found while scanning for the
    /// header when the scan found none.
    ///
    /// # Errors
    ///
    /// Fails with a parse error for unreadable input and with a header error
    /// when no header row or no business date can be found. Every other
    /// problem is recorded in the report.
    pub fn run(
        &self,
        bytes: &[u8],
        filename: &str,
        report_type: ReportType,
        date_hint: Option<NaiveDate>,
    ) -> Result<PipelineOutput> {
        let span = info_span!("ingest", filename, report_type = %report_type, streaming = false);
        let _guard = span.enter();
        let start = Instant::now();

        let sheet = read_sheet(bytes, filename, &self.options)
            .map_err(|err| err.into_pipeline_error(filename))?;
        let ctx = RunContext {
            filename,
            report_type,
            detected_date: sheet.location.detected_date.or(date_hint),
        };
        let output = self.process_table(sheet.table, &sheet.stats, &ctx)?;
        info!(
            rows = output.report.total_rows,
            errors = output.report.error_count,
            valid = output.report.is_valid,
            duration_ms = start.elapsed().as_millis(),
            "ingest complete"
        );
        Ok(output)
    }

    /// Processes a CSV file chunk by chunk.
    ///
    /// Row indices in the report are global. Workbook input is processed as
    /// a whole, as by [`IngestPipeline::run`].
    ///
    /// # Errors
    ///
    /// As [`IngestPipeline::run`]; a fatal error in any chunk aborts the file.
    pub fn run_streaming(
        &self,
        bytes: &[u8],
        filename: &str,
        report_type: ReportType,
        date_hint: Option<NaiveDate>,
    ) -> Result<PipelineOutput> {
        let reader = match StreamReader::new(bytes, filename, &self.options) {
            Ok(reader) => reader,
            Err(IngestError::Unstreamable) => {
                debug!(filename, "workbook input, processing as a whole");
                return self.run(bytes, filename, report_type, date_hint);
            }
            Err(err) => return Err(err.into_pipeline_error(filename)),
        };

        let span = info_span!("ingest", filename, report_type = %report_type, streaming = true);
        let _guard = span.enter();
        let start = Instant::now();
        let ctx = RunContext {
            filename,
            report_type,
            detected_date: reader.location().detected_date.or(date_hint),
        };
        let columns = reader.columns().to_vec();

        let mut merged: Option<PipelineOutput> = None;
        let mut chunks = 0usize;
        for chunk in reader {
            let chunk = chunk.map_err(|err| err.into_pipeline_error(filename))?;
            let output = self.process_table(chunk.table, &chunk.stats, &ctx)?;
            chunks += 1;
            match merged.as_mut() {
                Some(total) => total.absorb(output, chunk.meta.offset),
                None => merged = Some(output),
            }
        }
        let output = match merged {
            Some(output) => output,
            None => self.process_table(
                RawTable::new(columns, Vec::new()),
                &NormalizeStats::default(),
                &ctx,
            )?,
        };
        info!(
            chunks,
            rows = output.report.total_rows,
            errors = output.report.error_count,
            valid = output.report.is_valid,
            duration_ms = start.elapsed().as_millis(),
            "ingest complete"
        );
        Ok(output)
    }

    /// Runs the per-table stages. Issue rows are local to `table`.
    fn process_table(
        &self,
        mut table: RawTable,
        stats: &NormalizeStats,
        ctx: &RunContext<'_>,
    ) -> Result<PipelineOutput> {
        let profile = ctx.report_type.profile();
        let mut issues = IssueLog::new();
        if stats.truncated_rows > 0 {
            issues.push(
                ValidationIssue::new(
                    IssueKind::Warning,
                    FILE_LEVEL_ROW,
                    "",
                    format!(
                        "{} rows had values beyond the last header column; the extra cells were dropped",
                        stats.truncated_rows
                    ),
                )
                .with_value("truncated_rows", stats.truncated_rows),
            );
        }

        let (mapped, side_channel) = info_span!("map").in_scope(|| {
            let packed = pack_dynamic_columns(&mut table, profile);
            let mapper = FieldMapper::new(profile, self.options.fuzzy_threshold);
            (mapper.map_table(table, &mut issues), packed.entries)
        });

        let (coerced, business_date_source) = info_span!("coerce").in_scope(|| -> Result<_> {
            let mut coerced =
                TypeCoercer::new(profile).coerce(&mapped.table, side_channel, &mut issues);
            let source = backfill_business_date(
                &mut coerced,
                profile,
                ctx.filename,
                ctx.detected_date,
                &mut issues,
            )?;
            Ok((coerced, source))
        })?;

        let report = info_span!("validate").in_scope(|| {
            let validator = BusinessRuleValidator::new(profile, self.options.tolerance);
            issues.extend(validator.validate(&coerced));
            let file = FileContext {
                filename: ctx.filename,
                detected_date: ctx.detected_date,
                business_date_source,
            };
            build_report(profile, &coerced, &file, issues.into_vec())
        });

        debug!(
            rows = report.total_rows,
            errors = report.error_count,
            warnings = report.warning_count(),
            "table processed"
        );
        Ok(PipelineOutput {
            records: coerced.records,
            report,
        })
    }
}
