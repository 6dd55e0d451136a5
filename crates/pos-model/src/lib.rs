//! Data model shared by every stage of the POS report ingestion pipeline.

pub mod cell;
pub mod error;
pub mod issue;
pub mod options;
pub mod payment;
pub mod profile;
pub mod record;
pub mod report;
pub mod report_type;
pub mod value;

// === Raw input ===
pub use cell::{RawCell, RawTable};

// === Errors and issues ===
pub use error::{PipelineError, Result};
pub use issue::{FILE_LEVEL_ROW, IssueKind, IssueLog, Severity, ValidationIssue};

// === Configuration ===
pub use options::{
    DEFAULT_CHUNK_SIZE, DEFAULT_FUZZY_THRESHOLD, DEFAULT_HEADER_SCAN_ROWS, DEFAULT_TOLERANCE,
    PipelineOptions,
};
pub use profile::{
    BUSINESS_DATE_FIELD, BillRule, DerivedField, FieldRole, MONEY_FIELDS, ReportProfile, RuleKind,
};
pub use report_type::ReportType;

// === Output ===
pub use payment::{PaymentCategory, PaymentSource};
pub use record::{CanonicalRecord, CanonicalValue, SIDE_CHANNEL_KEY, SideChannelEntry};
pub use report::{
    BusinessDateSource, PaymentMethodMeta, ReportSummary, ValidationReport, sort_payment_methods,
};
