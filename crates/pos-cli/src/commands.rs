use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use comfy_table::{Cell, CellAlignment, Table};
use tracing::{debug, info, info_span};

use pos_core::{IngestPipeline, PipelineOutput};
use pos_ingest::{SourceFormat, detect_report_type, narrow_table, read_sheet};
use pos_model::{PipelineOptions, ReportType, RuleKind};

use crate::cli::{IngestArgs, InspectArgs};
use crate::config::{ingest_options, read_options};
use crate::summary::{align_column, apply_table_style, dim_cell, header_cell};
use crate::types::IngestResult;

/// Lists every supported report type.
pub fn run_report_types() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Type"),
        header_cell("Title"),
        header_cell("Columns"),
        header_cell("Rules"),
        header_cell("Detected by"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for report_type in ReportType::ALL {
        let profile = report_type.profile();
        let rules: Vec<&str> = profile.rules.iter().map(RuleKind::label).collect();
        table.add_row(vec![
            Cell::new(report_type.as_str()),
            Cell::new(profile.title),
            Cell::new(profile.mapping.len()),
            Cell::new(rules.join(", ")),
            Cell::new(profile.detect_columns.join(", ")),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Cleans and validates one file, optionally writing the result as JSON.
pub fn run_ingest(args: &IngestArgs) -> Result<IngestResult> {
    let filename = file_name(&args.file)?;
    let span = info_span!("file", filename = %filename);
    let _guard = span.enter();
    let start = Instant::now();

    let options = ingest_options(args)?;
    let bytes =
        fs::read(&args.file).with_context(|| format!("read {}", args.file.display()))?;
    let (report_type, detected_type) = match args.report_type {
        Some(arg) => (ReportType::from(arg), false),
        None => (detect_type(&bytes, &filename, &options)?, true),
    };
    info!(report_type = %report_type, detected_type, "processing file");

    let pipeline = IngestPipeline::new(options);
    let output = if args.stream {
        pipeline.run_streaming(&bytes, &filename, report_type, args.date_hint)
    } else {
        pipeline.run(&bytes, &filename, report_type, args.date_hint)
    }?;

    if let Some(path) = &args.output {
        write_output(path, &output)?;
        info!(path = %path.display(), "wrote output");
    }
    debug!(duration_ms = start.elapsed().as_millis(), "file done");

    Ok(IngestResult {
        file: args.file.clone(),
        report_type,
        detected_type,
        output,
        output_path: args.output.clone(),
        max_issues: args.max_issues,
    })
}

/// Shows how the header and columns of a file are read.
pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    let filename = file_name(&args.file)?;
    let options = read_options(&args.read)?;
    let bytes =
        fs::read(&args.file).with_context(|| format!("read {}", args.file.display()))?;
    let sheet = read_sheet(&bytes, &filename, &options)
        .map_err(|err| err.into_pipeline_error(&filename))?;
    let narrowed = narrow_table(&sheet.table).context("build column frame")?;

    println!("File: {}", args.file.display());
    println!(
        "Format: {}",
        match sheet.format {
            SourceFormat::Csv => "csv",
            SourceFormat::Workbook => "workbook",
        }
    );
    if let Some(encoding) = sheet.encoding {
        println!("Encoding: {encoding}");
    }
    println!(
        "Header: row {} ({} level{}, {} keyword hits)",
        sheet.location.header_index,
        sheet.header_levels,
        if sheet.header_levels == 1 { "" } else { "s" },
        sheet.location.score
    );
    match sheet.location.detected_date {
        Some(date) => println!("Detected date: {date}"),
        None => println!("Detected date: -"),
    }
    match detect_report_type(&sheet.table.columns, &filename) {
        Some(report_type) => println!("Report type: {report_type}"),
        None => println!("Report type: -"),
    }
    println!(
        "Rows: {} (dropped {} blank, {} total, {} truncated; {} empty columns, {} renamed)",
        sheet.table.rows.len(),
        sheet.stats.blank_rows,
        sheet.stats.total_rows,
        sheet.stats.truncated_rows,
        sheet.stats.empty_columns,
        sheet.stats.renamed_columns
    );

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Storage"),
        header_cell("Levels"),
    ]);
    apply_table_style(&mut table);
    for (column, storage) in &narrowed.storage {
        let levels = narrowed
            .categories
            .get(column)
            .map_or_else(|| dim_cell("-"), |levels| Cell::new(preview_levels(levels)));
        table.add_row(vec![Cell::new(column), Cell::new(storage.label()), levels]);
    }
    println!("{table}");
    println!("Estimated size: {} bytes", narrowed.estimated_size());
    Ok(())
}

fn detect_type(bytes: &[u8], filename: &str, options: &PipelineOptions) -> Result<ReportType> {
    let sheet =
        read_sheet(bytes, filename, options).map_err(|err| err.into_pipeline_error(filename))?;
    detect_report_type(&sheet.table.columns, filename).ok_or_else(|| {
        anyhow!("cannot tell the report type of {filename}; pass --report-type")
    })
}

fn write_output(path: &Path, output: &PipelineOutput) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, output)
        .with_context(|| format!("write {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("not a file path: {}", path.display()))
}

fn preview_levels(levels: &[String]) -> String {
    const SHOWN: usize = 5;
    let mut text = levels
        .iter()
        .take(SHOWN)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if levels.len() > SHOWN {
        text.push_str(&format!(", ... (+{})", levels.len() - SHOWN));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_levels() {
        let levels: Vec<String> = (0..7).map(|i| format!("L{i}")).collect();
        assert_eq!(preview_levels(&levels[..2]), "L0, L1");
        assert_eq!(preview_levels(&levels), "L0, L1, L2, L3, L4, ... (+2)");
    }
}
