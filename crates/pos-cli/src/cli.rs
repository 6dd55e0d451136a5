//! CLI argument definitions for `pos-etl`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use pos_model::ReportType;

#[derive(Parser)]
#[command(
    name = "pos-etl",
    version,
    about = "Clean and validate POS report exports",
    long_about = "Clean and validate point-of-sale report exports.\n\n\
                  Locates noisy headers, maps column labels to canonical fields,\n\
                  coerces values and checks monetary and time invariants."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Clean and validate one report file.
    Ingest(IngestArgs),

    /// Show how a file's header and columns are read, without cleaning it.
    Inspect(InspectArgs),

    /// List the supported report types.
    ReportTypes,
}

/// Options shared by commands that read a report file.
#[derive(Args, Default)]
pub struct ReadArgs {
    /// JSON file with pipeline options; flags below override its values.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Rows scanned when looking for the header row.
    #[arg(long = "header-scan-rows", value_name = "N")]
    pub header_scan_rows: Option<usize>,
}

#[derive(Parser)]
pub struct IngestArgs {
    /// Report file (CSV or Excel workbook).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Report type; detected from the header and filename when omitted.
    #[arg(long = "report-type", value_enum)]
    pub report_type: Option<ReportTypeArg>,

    /// Business date to use when neither the rows nor the filename carry one.
    #[arg(long = "date-hint", value_name = "YYYY-MM-DD")]
    pub date_hint: Option<NaiveDate>,

    /// Read CSV input in chunks.
    #[arg(long = "stream")]
    pub stream: bool,

    /// Absolute tolerance for monetary identities.
    #[arg(long = "tolerance", value_name = "AMOUNT")]
    pub tolerance: Option<f64>,

    /// Minimum similarity (0-1) to accept a fuzzy column match.
    #[arg(long = "fuzzy-threshold", value_name = "SCORE")]
    pub fuzzy_threshold: Option<f64>,

    /// Rows per chunk with --stream.
    #[arg(long = "chunk-size", value_name = "ROWS")]
    pub chunk_size: Option<usize>,

    /// Write cleaned records and the report as JSON.
    #[arg(long = "output", short = 'o', value_name = "JSON")]
    pub output: Option<PathBuf>,

    /// Maximum issues listed in the issue table.
    #[arg(long = "max-issues", default_value_t = 50)]
    pub max_issues: usize,

    #[command(flatten)]
    pub read: ReadArgs,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Report file (CSV or Excel workbook).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub read: ReadArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportTypeArg {
    Booking,
    Room,
    Sales,
    MemberChange,
}

impl From<ReportTypeArg> for ReportType {
    fn from(arg: ReportTypeArg) -> Self {
        match arg {
            ReportTypeArg::Booking => Self::Booking,
            ReportTypeArg::Room => Self::Room,
            ReportTypeArg::Sales => Self::Sales,
            ReportTypeArg::MemberChange => Self::MemberChange,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
