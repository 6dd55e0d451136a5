//! Pipeline options from an optional JSON file and command-line overrides.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use pos_model::PipelineOptions;

use crate::cli::{IngestArgs, ReadArgs};

/// Reads options from a JSON file. Missing keys keep their defaults.
pub fn load_options(path: &Path) -> Result<PipelineOptions> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let options: PipelineOptions =
        serde_json::from_str(&text).with_context(|| format!("parse config {}", path.display()))?;
    debug!(path = %path.display(), ?options, "loaded pipeline options");
    Ok(options)
}

/// Options for commands that only read a file.
pub fn read_options(args: &ReadArgs) -> Result<PipelineOptions> {
    let mut options = match &args.config {
        Some(path) => load_options(path)?,
        None => PipelineOptions::default(),
    };
    if let Some(rows) = args.header_scan_rows {
        options = options.with_header_scan_rows(rows);
    }
    Ok(options)
}

/// Options for an ingest run: config file first, then flags.
pub fn ingest_options(args: &IngestArgs) -> Result<PipelineOptions> {
    let mut options = read_options(&args.read)?;
    if let Some(tolerance) = args.tolerance {
        options = options.with_tolerance(tolerance);
    }
    if let Some(threshold) = args.fuzzy_threshold {
        options = options.with_fuzzy_threshold(threshold);
    }
    if let Some(size) = args.chunk_size {
        options = options.with_chunk_size(size);
    }
    check_options(&options)?;
    Ok(options)
}

fn check_options(options: &PipelineOptions) -> Result<()> {
    if !options.tolerance.is_finite() || options.tolerance < 0.0 {
        bail!("tolerance must be a non-negative number, got {}", options.tolerance);
    }
    if !(0.0..=1.0).contains(&options.fuzzy_threshold) {
        bail!(
            "fuzzy threshold must be between 0 and 1, got {}",
            options.fuzzy_threshold
        );
    }
    Ok(())
}
