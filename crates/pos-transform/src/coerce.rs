//! Per-role coercion of mapped rows into canonical records.

use std::collections::BTreeSet;

use tracing::debug;

use pos_model::value::{format_numeric, round_cents};
use pos_model::{
    BUSINESS_DATE_FIELD, CanonicalRecord, CanonicalValue, FieldRole, IssueKind, IssueLog, RawCell,
    RawTable, ReportProfile, SIDE_CHANNEL_KEY, SideChannelEntry, ValidationIssue,
};

use crate::datetime::parse_datetime;

/// Non-blank cells inspected to decide whether an unlisted column is numeric.
pub const NUMERIC_SAMPLE_SIZE: usize = 5;

/// Coerced records and the canonical fields they carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoercedTable {
    pub records: Vec<CanonicalRecord>,
    /// Fields present in every record, excluding the side channel.
    pub fields: BTreeSet<String>,
}

impl CoercedTable {
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Restores the integer form of identifiers mangled into exponent notation.
///
/// `6.21234567890123E+15` becomes `6212345678901230`; numeric cells lose a
/// trailing `.0`. Other text is returned trimmed.
pub fn repair_identifier(cell: &RawCell) -> String {
    match cell {
        RawCell::Number(value) if value.is_finite() => format_numeric(*value),
        RawCell::Text(text) => {
            let text = text.trim();
            if text.contains(['e', 'E'])
                && let Ok(value) = text.parse::<f64>()
                && value.is_finite()
            {
                return format!("{:.0}", value.trunc());
            }
            text.to_string()
        }
        other => other.to_text(),
    }
}

/// Whether the first non-blank cells of a column all read as numbers.
fn column_looks_numeric<'a>(cells: impl Iterator<Item = &'a RawCell>) -> bool {
    let mut sampled = 0;
    for cell in cells.filter(|cell| !cell.is_blank()).take(NUMERIC_SAMPLE_SIZE) {
        if cell.as_number().is_none() {
            return false;
        }
        sampled += 1;
    }
    sampled > 0
}

fn data_error(issues: &mut IssueLog, row: usize, field: &str, cell: &RawCell, expected: &str) {
    issues.push(
        ValidationIssue::new(
            IssueKind::Data,
            row as i64,
            field,
            format!("cannot read '{}' as {expected}; 0 used", cell.to_text()),
        )
        .with_value(field, cell.to_json()),
    );
}

/// Coerces the rows of a mapped table according to a report profile.
#[derive(Debug, Clone, Copy)]
pub struct TypeCoercer {
    profile: &'static ReportProfile,
}

impl TypeCoercer {
    pub fn new(profile: &'static ReportProfile) -> Self {
        Self { profile }
    }

    fn coerce_cell(
        &self,
        field: &str,
        role: FieldRole,
        cell: &RawCell,
        row: usize,
        issues: &mut IssueLog,
    ) -> CanonicalValue {
        match role {
            FieldRole::DateTime => match parse_datetime(cell) {
                Some(dt) if field == BUSINESS_DATE_FIELD => CanonicalValue::Date(dt.date()),
                Some(dt) => CanonicalValue::DateTime(dt),
                None => CanonicalValue::Null,
            },
            FieldRole::Integer => {
                if cell.is_blank() {
                    return CanonicalValue::Integer(0);
                }
                match cell.as_number() {
                    Some(value) => CanonicalValue::Integer(value.trunc() as i64),
                    None => {
                        data_error(issues, row, field, cell, "an integer");
                        CanonicalValue::Integer(0)
                    }
                }
            }
            FieldRole::Identifier => CanonicalValue::Text(repair_identifier(cell)),
            FieldRole::Text => CanonicalValue::Text(cell.to_text().trim().to_string()),
            FieldRole::Numeric => {
                if cell.is_blank() {
                    return CanonicalValue::Number(0.0);
                }
                match cell.as_number() {
                    Some(value) => CanonicalValue::Number(round_cents(value)),
                    None => {
                        data_error(issues, row, field, cell, "a number");
                        CanonicalValue::Number(0.0)
                    }
                }
            }
        }
    }

    fn default_value(&self, field: &str) -> CanonicalValue {
        match self.profile.role(field) {
            FieldRole::Integer => CanonicalValue::Integer(0),
            _ => CanonicalValue::Number(0.0),
        }
    }

    /// Builds one record per row of `table`, whose columns are canonical
    /// fields, attaching the matching side-channel entry.
    ///
    /// Money fields are coerced cell by cell; an unreadable cell becomes 0
    /// with a data error. Other numeric-role columns are sampled:
    /// numeric-looking columns are coerced to numbers, the rest are kept as
    /// text. Core numeric fields missing from
    /// the table are added as 0, and the profile's derived field is computed.
    pub fn coerce(
        &self,
        table: &RawTable,
        side_channel: Vec<SideChannelEntry>,
        issues: &mut IssueLog,
    ) -> CoercedTable {
        let roles: Vec<FieldRole> = table
            .columns
            .iter()
            .enumerate()
            .map(|(idx, field)| match self.profile.role(field) {
                FieldRole::Numeric
                    if !self.profile.is_money_field(field)
                        && !column_looks_numeric(table.column_cells(idx)) =>
                {
                    FieldRole::Text
                }
                role => role,
            })
            .collect();

        let mut side_channel = side_channel.into_iter();
        let mut records = Vec::with_capacity(table.row_count());
        for (row_idx, row) in table.rows.iter().enumerate() {
            let mut record = CanonicalRecord::new();
            for ((field, role), cell) in table.columns.iter().zip(&roles).zip(row) {
                let value = self.coerce_cell(field, *role, cell, row_idx, issues);
                record.insert(field.as_str(), value);
            }
            for field in self.profile.core_numeric_fields {
                if !record.contains(field) {
                    record.insert(*field, self.default_value(field));
                }
            }
            let entry = side_channel.next().unwrap_or_default();
            record.insert(SIDE_CHANNEL_KEY, CanonicalValue::SideChannel(entry));
            records.push(record);
        }

        let mut fields: BTreeSet<String> = table.columns.iter().cloned().collect();
        fields.extend(self.profile.core_numeric_fields.iter().map(|f| (*f).to_string()));
        self.apply_derived(&mut records, &mut fields);

        debug!(
            report_type = %self.profile.report_type,
            rows = records.len(),
            fields = fields.len(),
            "coerced records"
        );
        CoercedTable { records, fields }
    }

    /// Computes the conditional derived field, 0 when the marker is absent.
    fn apply_derived(&self, records: &mut [CanonicalRecord], fields: &mut BTreeSet<String>) {
        let Some(derived) = self.profile.derived else {
            return;
        };
        for record in records.iter_mut() {
            let marked = record
                .text(derived.marker_field)
                .is_some_and(|text| text.contains(derived.marker));
            let value = if marked {
                round_cents(
                    derived
                        .addends
                        .iter()
                        .map(|field| record.amount(field))
                        .sum(),
                )
            } else {
                0.0
            };
            record.insert(derived.field, CanonicalValue::Number(value));
            if let Some(mirror) = derived.mirror_field {
                record.insert(mirror, CanonicalValue::Number(value));
            }
        }
        fields.insert(derived.field.to_string());
        if let Some(mirror) = derived.mirror_field {
            fields.insert(mirror.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pos_model::ReportType;

    fn table(columns: &[&str], rows: Vec<Vec<RawCell>>) -> RawTable {
        RawTable::new(columns.iter().map(|c| (*c).to_string()).collect(), rows)
    }

    #[test]
    fn test_repair_identifier() {
        assert_eq!(
            repair_identifier(&RawCell::text("6.21234567890123E+15")),
            "6212345678901230"
        );
        assert_eq!(repair_identifier(&RawCell::Number(13_800_138_000.0)), "13800138000");
        assert_eq!(repair_identifier(&RawCell::text(" 0138001 ")), "0138001");
        assert_eq!(repair_identifier(&RawCell::text("Eve")), "Eve");
        assert_eq!(repair_identifier(&RawCell::Blank), "");
    }

    #[test]
    fn test_roles() {
        let coercer = TypeCoercer::new(ReportType::Room.profile());
        let mut issues = IssueLog::new();
        let input = table(
            &["room_no", "order_no", "open_time", "duration_min", "actual_amount", "biz_date"],
            vec![vec![
                RawCell::text("A01"),
                RawCell::text("1.2E+3"),
                RawCell::text("2025-12-01 20:00"),
                RawCell::text("180.9"),
                RawCell::text("¥1,280.456"),
                RawCell::text("2025/12/01"),
            ]],
        );
        let coerced = coercer.coerce(&input, Vec::new(), &mut issues);
        assert!(issues.is_empty());
        let record = &coerced.records[0];
        assert_eq!(record.text("room_no"), Some("A01"));
        assert_eq!(record.text("order_no"), Some("1200"));
        assert_eq!(
            record.datetime("open_time"),
            NaiveDate::from_ymd_opt(2025, 12, 1).unwrap().and_hms_opt(20, 0, 0)
        );
        assert_eq!(record.get("duration_min"), Some(&CanonicalValue::Integer(180)));
        assert_eq!(record.amount("actual_amount"), 1280.46);
        assert_eq!(
            record.get("biz_date"),
            Some(&CanonicalValue::Date(NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()))
        );
        assert!(record.side_channel().is_some_and(SideChannelEntry::is_empty));
    }

    #[test]
    fn test_bad_numeric_cell_is_data_error() {
        let coercer = TypeCoercer::new(ReportType::Booking.profile());
        let mut issues = IssueLog::new();
        let mut rows: Vec<Vec<RawCell>> = (1..=5)
            .map(|n| vec![RawCell::Number(f64::from(n) * 10.0), RawCell::Number(1.0)])
            .collect();
        rows[1][1] = RawCell::text("两桌");
        rows.push(vec![RawCell::text("待定"), RawCell::Blank]);
        let input = table(&["actual_amount", "booking_qty"], rows);
        let coerced = coercer.coerce(&input, Vec::new(), &mut issues);
        assert_eq!(coerced.records[1].get("booking_qty"), Some(&CanonicalValue::Integer(0)));
        assert_eq!(coerced.records[4].amount("actual_amount"), 50.0);
        assert_eq!(coerced.records[5].amount("actual_amount"), 0.0);
        assert_eq!(coerced.records[5].get("booking_qty"), Some(&CanonicalValue::Integer(0)));
        let rows: Vec<(i64, &str, IssueKind)> = issues
            .issues()
            .iter()
            .map(|issue| (issue.row_index, issue.column.as_str(), issue.kind))
            .collect();
        assert_eq!(
            rows,
            vec![(1, "booking_qty", IssueKind::Data), (5, "actual_amount", IssueKind::Data)]
        );
    }

    #[test]
    fn test_placeholder_in_money_column_is_data_error() {
        let coercer = TypeCoercer::new(ReportType::Booking.profile());
        let mut issues = IssueLog::new();
        let input = table(
            &["pay_wechat", "actual_amount"],
            vec![
                vec![RawCell::text("60"), RawCell::text("待定")],
                vec![RawCell::text("待定"), RawCell::text("100")],
            ],
        );
        let coerced = coercer.coerce(&input, Vec::new(), &mut issues);
        assert_eq!(coerced.records[0].get("actual_amount"), Some(&CanonicalValue::Number(0.0)));
        assert_eq!(coerced.records[1].get("actual_amount"), Some(&CanonicalValue::Number(100.0)));
        assert_eq!(coerced.records[0].get("pay_wechat"), Some(&CanonicalValue::Number(60.0)));
        let located: Vec<(i64, &str)> = issues
            .issues()
            .iter()
            .map(|issue| (issue.row_index, issue.column.as_str()))
            .collect();
        assert_eq!(located, vec![(0, "actual_amount"), (1, "pay_wechat")]);
    }

    #[test]
    fn test_text_column_is_not_coerced() {
        let coercer = TypeCoercer::new(ReportType::Booking.profile());
        let mut issues = IssueLog::new();
        let input = table(
            &["beverage_subtotal"],
            vec![vec![RawCell::text("见附表")], vec![RawCell::Number(5.0)]],
        );
        let coerced = coercer.coerce(&input, Vec::new(), &mut issues);
        assert!(issues.is_empty());
        assert_eq!(coerced.records[0].text("beverage_subtotal"), Some("见附表"));
    }

    #[test]
    fn test_core_fields_are_zero_filled() {
        let coercer = TypeCoercer::new(ReportType::Booking.profile());
        let mut issues = IssueLog::new();
        let input = table(&["department"], vec![vec![RawCell::text("营销部")]]);
        let coerced = coercer.coerce(&input, Vec::new(), &mut issues);
        assert_eq!(coerced.records[0].get("booking_qty"), Some(&CanonicalValue::Integer(0)));
        assert!(coerced.has_field("booking_qty"));
    }

    #[test]
    fn test_recharge_income_is_derived() {
        let coercer = TypeCoercer::new(ReportType::MemberChange.profile());
        let mut issues = IssueLog::new();
        let input = table(
            &["change_type", "room_amount_principal", "drink_amount_principal"],
            vec![
                vec![RawCell::text("会员充值"), RawCell::Number(500.0), RawCell::Number(300.0)],
                vec![RawCell::text("消费"), RawCell::Number(-80.0), RawCell::Number(0.0)],
            ],
        );
        let coerced = coercer.coerce(&input, Vec::new(), &mut issues);
        assert_eq!(coerced.records[0].amount("recharge_real_income"), 800.0);
        assert_eq!(coerced.records[0].amount("actual_amount"), 800.0);
        assert_eq!(coerced.records[1].amount("recharge_real_income"), 0.0);
        assert!(coerced.has_field("actual_amount"));
    }
}
