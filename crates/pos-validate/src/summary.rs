//! File summary and report assembly.

use chrono::NaiveDate;

use pos_model::{
    BusinessDateSource, ReportProfile, ReportSummary, ReportType, ValidationIssue,
    ValidationReport,
};
use pos_transform::{
    CoercedTable, collect_payment_methods, file_level_date, store_from_filename,
    stores_from_records, summarize_stores,
};

/// Field naming the store a member-change row was booked at.
pub const MEMBER_STORE_FIELD: &str = "biz_store_name";

/// File-level facts gathered before validation.
#[derive(Debug, Clone, Copy)]
pub struct FileContext<'a> {
    pub filename: &'a str,
    /// Date found while scanning for the header, or supplied by the caller.
    pub detected_date: Option<NaiveDate>,
    pub business_date_source: Option<BusinessDateSource>,
}

/// Builds the summary attached to a report. Counts are filled in by
/// [`ValidationReport::new`].
pub fn summarize(profile: &ReportProfile, table: &CoercedTable, ctx: &FileContext<'_>) -> ReportSummary {
    let mut summary = ReportSummary::new(profile.report_type);

    let mut stores = if profile.report_type == ReportType::MemberChange {
        stores_from_records(&table.records, MEMBER_STORE_FIELD)
    } else {
        Vec::new()
    };
    if stores.is_empty() {
        stores.extend(store_from_filename(ctx.filename));
    }
    summary.store_name = summarize_stores(&stores);
    summary.store_names = stores;

    summary.detected_date = file_level_date(ctx.filename, ctx.detected_date).map(|(date, _)| date);
    summary.business_date_source = ctx.business_date_source;

    let fields: Vec<&String> = table.fields.iter().collect();
    summary.payment_methods = collect_payment_methods(&fields, &table.records);
    summary
}

/// Assembles the report for one file or chunk from every issue recorded.
pub fn build_report(
    profile: &ReportProfile,
    table: &CoercedTable,
    ctx: &FileContext<'_>,
    issues: Vec<ValidationIssue>,
) -> ValidationReport {
    ValidationReport::new(issues, table.len(), summarize(profile, table, ctx))
}
