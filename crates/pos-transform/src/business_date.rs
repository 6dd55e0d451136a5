//! Business-date backfill.
//!
//! Each row gets one operating date in `biz_date`. Sources, best first:
//!
//! 1. a `biz_date` column already present in the source;
//! 2. the profile's transaction timestamp, one date per row;
//! 3. a date embedded in the filename;
//! 4. the date found while scanning for the header, or the caller's hint.
//!
//! Rows whose per-row date is missing fall back to the best file-level date
//! with a single warning. No date at all is fatal.

use chrono::NaiveDate;
use tracing::{debug, warn};

use pos_model::{
    BUSINESS_DATE_FIELD, BusinessDateSource, CanonicalRecord, CanonicalValue, FILE_LEVEL_ROW,
    IssueKind, IssueLog, PipelineError, ReportProfile, Result, ValidationIssue,
};

use crate::coerce::CoercedTable;
use crate::metadata::date_from_filename;

/// Best file-level date and where it came from.
pub fn file_level_date(
    filename: &str,
    detected: Option<NaiveDate>,
) -> Option<(NaiveDate, BusinessDateSource)> {
    date_from_filename(filename)
        .map(|date| (date, BusinessDateSource::Filename))
        .or_else(|| detected.map(|date| (date, BusinessDateSource::Detected)))
}

fn source_label(source: BusinessDateSource) -> &'static str {
    match source {
        BusinessDateSource::Column => "business date column",
        BusinessDateSource::Timestamp => "transaction timestamp",
        BusinessDateSource::Filename => "filename",
        BusinessDateSource::Detected => "report heading",
    }
}

/// Per-row date source available in the table, if any.
fn row_source(
    table: &CoercedTable,
    profile: &ReportProfile,
) -> Option<(BusinessDateSource, &'static str)> {
    if table.has_field(BUSINESS_DATE_FIELD) {
        return Some((BusinessDateSource::Column, BUSINESS_DATE_FIELD));
    }
    profile
        .timestamp_field
        .filter(|field| table.has_field(field))
        .map(|field| (BusinessDateSource::Timestamp, field))
}

fn row_date(record: &CanonicalRecord, field: &str) -> Option<NaiveDate> {
    record.get(field)?.as_datetime().map(|dt| dt.date())
}

fn missing_date_error(filename: &str) -> PipelineError {
    PipelineError::header(
        filename,
        "no business date could be derived from the rows, the filename or the report heading",
    )
}

/// Writes `biz_date` into every record and returns the source used.
///
/// Profiles that do not require a business date are left untouched.
pub fn backfill_business_date(
    table: &mut CoercedTable,
    profile: &ReportProfile,
    filename: &str,
    detected: Option<NaiveDate>,
    issues: &mut IssueLog,
) -> Result<Option<BusinessDateSource>> {
    if !profile.requires_business_date {
        return Ok(None);
    }
    let fallback = file_level_date(filename, detected);

    let source = match row_source(table, profile) {
        Some((source, field)) => {
            let mut missing = 0usize;
            for record in &mut table.records {
                let date = match row_date(record, field) {
                    Some(date) => date,
                    None => {
                        missing += 1;
                        fallback
                            .map(|(date, _)| date)
                            .ok_or_else(|| missing_date_error(filename))?
                    }
                };
                record.insert(BUSINESS_DATE_FIELD, CanonicalValue::Date(date));
            }
            if let Some((date, fallback_source)) = fallback.filter(|_| missing > 0) {
                warn!(missing, %date, "rows without a business date use the file date");
                issues.push(
                    ValidationIssue::new(
                        IssueKind::Warning,
                        FILE_LEVEL_ROW,
                        BUSINESS_DATE_FIELD,
                        format!(
                            "{missing} rows have no {}; {date} from the {} was used",
                            source_label(source),
                            source_label(fallback_source)
                        ),
                    )
                    .with_value("missing_rows", missing)
                    .with_value("fallback_date", date.to_string())
                    .with_value("fallback_source", source_label(fallback_source)),
                );
            }
            source
        }
        None => {
            let (date, source) = fallback.ok_or_else(|| missing_date_error(filename))?;
            if source == BusinessDateSource::Detected {
                issues.push(
                    ValidationIssue::new(
                        IssueKind::Warning,
                        FILE_LEVEL_ROW,
                        BUSINESS_DATE_FIELD,
                        format!("business date {date} taken from the report heading"),
                    )
                    .with_value("fallback_date", date.to_string()),
                );
            }
            for record in &mut table.records {
                record.insert(BUSINESS_DATE_FIELD, CanonicalValue::Date(date));
            }
            source
        }
    };

    table.fields.insert(BUSINESS_DATE_FIELD.to_string());
    debug!(?source, rows = table.records.len(), "business date assigned");
    Ok(Some(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pos_model::ReportType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table_with(field: &str, values: Vec<CanonicalValue>) -> CoercedTable {
        let records = values
            .into_iter()
            .map(|value| {
                let mut record = CanonicalRecord::new();
                record.insert(field, value);
                record
            })
            .collect();
        CoercedTable {
            records,
            fields: [field.to_string()].into(),
        }
    }

    fn biz_dates(table: &CoercedTable) -> Vec<Option<&CanonicalValue>> {
        table
            .records
            .iter()
            .map(|record| record.get(BUSINESS_DATE_FIELD))
            .collect()
    }

    #[test]
    fn test_timestamp_rows_with_filename_fallback() {
        let profile = ReportType::MemberChange.profile();
        let mut table = table_with(
            "change_time",
            vec![
                CanonicalValue::DateTime(date(2025, 11, 30).and_hms_opt(23, 50, 0).unwrap()),
                CanonicalValue::Null,
            ],
        );
        let mut issues = IssueLog::new();
        let source = backfill_business_date(
            &mut table,
            profile,
            "会员变动_2025-12-01.csv",
            None,
            &mut issues,
        )
        .unwrap();
        assert_eq!(source, Some(BusinessDateSource::Timestamp));
        assert_eq!(
            biz_dates(&table),
            vec![
                Some(&CanonicalValue::Date(date(2025, 11, 30))),
                Some(&CanonicalValue::Date(date(2025, 12, 1))),
            ]
        );
        assert_eq!(issues.len(), 1);
        let issue = &issues.issues()[0];
        assert_eq!(issue.kind, IssueKind::Warning);
        assert_eq!(issue.raw_snapshot["missing_rows"], 1);
        assert_eq!(issue.raw_snapshot["fallback_source"], "filename");
        assert!(table.has_field(BUSINESS_DATE_FIELD));
    }

    #[test]
    fn test_filename_date_needs_no_warning() {
        let profile = ReportType::Booking.profile();
        let mut table = table_with("actual_amount", vec![CanonicalValue::Number(1.0)]);
        let mut issues = IssueLog::new();
        let source = backfill_business_date(
            &mut table,
            profile,
            "预订汇总20251201.csv",
            Some(date(2025, 1, 1)),
            &mut issues,
        )
        .unwrap();
        assert_eq!(source, Some(BusinessDateSource::Filename));
        assert!(issues.is_empty());
        assert_eq!(biz_dates(&table), vec![Some(&CanonicalValue::Date(date(2025, 12, 1)))]);
    }

    #[test]
    fn test_detected_date_warns() {
        let profile = ReportType::Room.profile();
        let mut table = table_with("actual_amount", vec![CanonicalValue::Number(1.0)]);
        let mut issues = IssueLog::new();
        let source = backfill_business_date(
            &mut table,
            profile,
            "room.csv",
            Some(date(2025, 12, 2)),
            &mut issues,
        )
        .unwrap();
        assert_eq!(source, Some(BusinessDateSource::Detected));
        assert_eq!(issues.warning_count(), 1);
        assert_eq!(issues.error_count(), 0);
    }

    #[test]
    fn test_no_date_is_fatal() {
        let profile = ReportType::Sales.profile();
        let mut table = table_with("actual_amount", vec![CanonicalValue::Number(1.0)]);
        let mut issues = IssueLog::new();
        let err = backfill_business_date(&mut table, profile, "sales.csv", None, &mut issues)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Header { .. }));
    }

    #[test]
    fn test_business_date_column_wins() {
        let profile = ReportType::Sales.profile();
        let mut table = table_with(
            BUSINESS_DATE_FIELD,
            vec![CanonicalValue::Date(date(2025, 12, 3))],
        );
        let mut issues = IssueLog::new();
        let source = backfill_business_date(
            &mut table,
            profile,
            "sales_20251201.csv",
            None,
            &mut issues,
        )
        .unwrap();
        assert_eq!(source, Some(BusinessDateSource::Column));
        assert_eq!(biz_dates(&table), vec![Some(&CanonicalValue::Date(date(2025, 12, 3)))]);
        assert!(issues.is_empty());
    }
}
